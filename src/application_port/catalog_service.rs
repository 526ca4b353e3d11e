use crate::application_port::AuthContext;
use crate::domain_model::Product;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("product not found")]
    NotFound,
    #[error("product code already exists")]
    CodeExists,
    #[error("operation requires admin role")]
    Forbidden,
    #[error("store error: {0}")]
    Store(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInput {
    pub code: String,
    pub name: String,
    pub category: String,
    pub price_cents: u64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    async fn list(&self, filter: ProductFilter) -> Result<Vec<Product>, CatalogError>;
    async fn get(&self, code: &str) -> Result<Product, CatalogError>;
    async fn create(&self, ctx: &AuthContext, input: ProductInput)
    -> Result<Product, CatalogError>;
    async fn update(
        &self,
        ctx: &AuthContext,
        code: &str,
        input: ProductInput,
    ) -> Result<Product, CatalogError>;
    async fn delete(&self, ctx: &AuthContext, code: &str) -> Result<(), CatalogError>;
}
