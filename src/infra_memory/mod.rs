mod product_store_memory;
mod user_store_memory;

pub use product_store_memory::*;
pub use user_store_memory::*;
