use crate::application_port::CatalogError;
use crate::domain_model::Product;

#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Product>, CatalogError>;
    async fn get(&self, code: &str) -> Result<Option<Product>, CatalogError>;
    /// Fails with `CodeExists` if a product with the same code is present.
    async fn insert(&self, product: Product) -> Result<(), CatalogError>;
    /// Fails with `NotFound` if no product with the code exists.
    async fn update(&self, product: Product) -> Result<(), CatalogError>;
    async fn remove(&self, code: &str) -> Result<(), CatalogError>;
}
