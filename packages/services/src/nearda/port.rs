use da_gateway_encoding::nearda::FrameRef;

use crate::Result;

/// NEAR DA sidecar.
#[allow(async_fn_in_trait)]
#[trait_variant::make(Send)]
#[cfg_attr(feature = "test-helpers", mockall::automock)]
pub trait Api {
    /// Force submits `data`, returning the raw frame reference.
    async fn submit(&self, data: Vec<u8>) -> Result<Vec<u8>>;
    async fn get(&self, frame: FrameRef) -> Result<Vec<u8>>;
}
