use crate::{Result, types::BlobStatusReply};

/// The EigenDA disperser.
#[allow(async_fn_in_trait)]
#[trait_variant::make(Send)]
#[cfg_attr(feature = "test-helpers", mockall::automock)]
pub trait Api {
    /// Hands an already padded payload to the disperser, returning the
    /// request id.
    async fn disperse_blob(&self, data: Vec<u8>) -> Result<Vec<u8>>;
    async fn blob_status(&self, request_id: Vec<u8>) -> Result<BlobStatusReply>;
    async fn retrieve_blob(&self, batch_header_hash: Vec<u8>, blob_index: u32) -> Result<Vec<u8>>;
}
