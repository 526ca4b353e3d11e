use crate::application_port::{
    AuthContext, CatalogError, CatalogService, ProductFilter, ProductInput,
};
use crate::domain_model::{Product, Role};
use crate::domain_port::ProductStore;
use std::sync::Arc;

pub struct RealCatalogService {
    store: Arc<dyn ProductStore>,
}

impl RealCatalogService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    fn require_admin(ctx: &AuthContext) -> Result<(), CatalogError> {
        if ctx.role == Role::Admin {
            Ok(())
        } else {
            Err(CatalogError::Forbidden)
        }
    }

    fn matches(product: &Product, filter: &ProductFilter) -> bool {
        if let Some(category) = &filter.category {
            if !product.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(search) = &filter.search {
            let needle = search.to_lowercase();
            if !product.name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

impl From<ProductInput> for Product {
    fn from(input: ProductInput) -> Self {
        Product {
            code: input.code,
            name: input.name,
            category: input.category,
            price_cents: input.price_cents,
            description: input.description,
        }
    }
}

#[async_trait::async_trait]
impl CatalogService for RealCatalogService {
    async fn list(&self, filter: ProductFilter) -> Result<Vec<Product>, CatalogError> {
        let products = self.store.list().await?;
        Ok(products
            .into_iter()
            .filter(|p| Self::matches(p, &filter))
            .collect())
    }

    async fn get(&self, code: &str) -> Result<Product, CatalogError> {
        self.store.get(code).await?.ok_or(CatalogError::NotFound)
    }

    async fn create(
        &self,
        ctx: &AuthContext,
        input: ProductInput,
    ) -> Result<Product, CatalogError> {
        Self::require_admin(ctx)?;
        let product = Product::from(input);
        self.store.insert(product.clone()).await?;
        Ok(product)
    }

    async fn update(
        &self,
        ctx: &AuthContext,
        code: &str,
        input: ProductInput,
    ) -> Result<Product, CatalogError> {
        Self::require_admin(ctx)?;
        let mut product = Product::from(input);
        // the path segment wins over whatever the body carries
        product.code = code.to_string();
        self.store.update(product.clone()).await?;
        Ok(product)
    }

    async fn delete(&self, ctx: &AuthContext, code: &str) -> Result<(), CatalogError> {
        Self::require_admin(ctx)?;
        self.store.remove(code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::UserId;
    use crate::infra_memory::MemoryProductStore;

    fn admin_ctx() -> AuthContext {
        AuthContext {
            user_id: UserId(uuid::Uuid::new_v4()),
            role: Role::Admin,
        }
    }

    fn user_ctx() -> AuthContext {
        AuthContext {
            user_id: UserId(uuid::Uuid::new_v4()),
            role: Role::User,
        }
    }

    fn input(code: &str, name: &str, category: &str) -> ProductInput {
        ProductInput {
            code: code.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            price_cents: 4999,
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn non_admin_cannot_mutate() {
        let service = RealCatalogService::new(Arc::new(MemoryProductStore::new()));
        let err = service
            .create(&user_ctx(), input("tee-01", "Basic Tee", "shirts"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Forbidden));
    }

    #[tokio::test]
    async fn crud_round_trip_with_admin() {
        let service = RealCatalogService::new(Arc::new(MemoryProductStore::new()));
        let ctx = admin_ctx();

        service
            .create(&ctx, input("tee-01", "Basic Tee", "shirts"))
            .await
            .unwrap();
        service
            .create(&ctx, input("jean-01", "Slim Jeans", "pants"))
            .await
            .unwrap();

        let all = service.list(ProductFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = service
            .list(ProductFilter {
                category: Some("shirts".to_string()),
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].code, "tee-01");

        let updated = service
            .update(&ctx, "tee-01", input("ignored", "Premium Tee", "shirts"))
            .await
            .unwrap();
        assert_eq!(updated.code, "tee-01");
        assert_eq!(updated.name, "Premium Tee");

        service.delete(&ctx, "tee-01").await.unwrap();
        let err = service.get("tee-01").await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound));
    }
}
