mod auth_service_fake;
mod auth_service_impl;
mod catalog_service_impl;

pub use auth_service_fake::*;
pub use auth_service_impl::*;
pub use catalog_service_impl::*;
