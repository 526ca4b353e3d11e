mod api_client;
mod single_flight;

pub use api_client::*;
pub use single_flight::*;
