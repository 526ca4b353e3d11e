mod product;
mod session;
mod user;

pub use product::*;
pub use session::*;
pub use user::*;
