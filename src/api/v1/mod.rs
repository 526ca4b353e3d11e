mod cookie;
mod error;
mod handler;
mod router;

pub use cookie::{CookieConfig, REFRESH_COOKIE, REFRESH_COOKIE_PATH};
pub use error::recover_error;
pub use router::routes;
