mod client;
mod error;

pub use client::{BeaconClient, ChainTiming};
pub use error::{Error, Result};
