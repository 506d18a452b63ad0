mod bindings;
mod client;
mod error;

pub use client::DisperserGrpc;
pub use error::{Error, Result};
