use std::time::SystemTime;

use da_gateway_encoding::anytrust::Certificate;

use crate::Result;

/// Stores a message with the DAS committee until `timeout` (unix seconds).
#[allow(async_fn_in_trait)]
#[trait_variant::make(Send)]
#[cfg_attr(feature = "test-helpers", mockall::automock)]
pub trait Writer {
    async fn store(&self, message: Vec<u8>, timeout: u64) -> Result<Certificate>;
}

#[allow(async_fn_in_trait)]
#[trait_variant::make(Send)]
#[cfg_attr(feature = "test-helpers", mockall::automock)]
pub trait Reader {
    async fn get_by_hash(&self, data_hash: [u8; 32]) -> Result<Vec<u8>>;
}

#[cfg_attr(feature = "test-helpers", mockall::automock)]
pub trait Clock {
    fn now(&self) -> SystemTime;
}
