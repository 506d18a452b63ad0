use crate::Result;

/// Celestia DA proxy bound to one namespace.
#[allow(async_fn_in_trait)]
#[trait_variant::make(Send)]
#[cfg_attr(feature = "test-helpers", mockall::automock)]
pub trait Api {
    /// Returns one id per submitted blob.
    async fn submit(&self, blobs: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>>;
    async fn get(&self, ids: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>>;
}
