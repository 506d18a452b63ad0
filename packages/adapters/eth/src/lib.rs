mod error;
mod http;

pub use alloy::primitives::Address;
pub use error::{Error, Result};
pub use http::HttpClient;
