mod product_store;
mod user_store;

pub use product_store::*;
pub use user_store::*;
