use crate::application_port::CatalogError;
use crate::domain_model::Product;
use crate::domain_port::ProductStore;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

pub struct MemoryProductStore {
    products: DashMap<String, Product>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        MemoryProductStore {
            products: DashMap::new(),
        }
    }
}

impl Default for MemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self) -> Result<Vec<Product>, CatalogError> {
        let mut products: Vec<Product> = self.products.iter().map(|p| p.value().clone()).collect();
        products.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(products)
    }

    async fn get(&self, code: &str) -> Result<Option<Product>, CatalogError> {
        Ok(self.products.get(code).map(|p| p.value().clone()))
    }

    async fn insert(&self, product: Product) -> Result<(), CatalogError> {
        match self.products.entry(product.code.clone()) {
            Entry::Occupied(_) => Err(CatalogError::CodeExists),
            Entry::Vacant(slot) => {
                slot.insert(product);
                Ok(())
            }
        }
    }

    async fn update(&self, product: Product) -> Result<(), CatalogError> {
        match self.products.entry(product.code.clone()) {
            Entry::Occupied(mut slot) => {
                slot.insert(product);
                Ok(())
            }
            Entry::Vacant(_) => Err(CatalogError::NotFound),
        }
    }

    async fn remove(&self, code: &str) -> Result<(), CatalogError> {
        self.products
            .remove(code)
            .map(|_| ())
            .ok_or(CatalogError::NotFound)
    }
}
