use da_gateway_encoding::blob::Blob;

use crate::{Result, types::BlockHeader};

#[allow(async_fn_in_trait)]
#[trait_variant::make(Send)]
#[cfg_attr(feature = "test-helpers", mockall::automock)]
pub trait Api {
    /// Blobs included in `block` whose commitments hash to the given
    /// versioned hashes, in the order of `versioned_hashes`.
    async fn blobs(
        &self,
        block: BlockHeader,
        versioned_hashes: Vec<[u8; 32]>,
    ) -> Result<Vec<Blob>>;
}
