use serde::{Deserialize, Serialize};

/// A catalog entry, addressed by its merchant-assigned code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub code: String,
    pub name: String,
    pub category: String,
    pub price_cents: u64,
    pub description: String,
}
