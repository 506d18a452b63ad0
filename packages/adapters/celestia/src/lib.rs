mod client;
mod error;

pub use client::DaProxyClient;
pub use error::{Error, Result};
