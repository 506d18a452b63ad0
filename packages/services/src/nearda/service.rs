use async_trait::async_trait;
use da_gateway_encoding::{nearda::FrameRef, reference};
use tracing::{debug, info};

use super::port::Api;
use crate::{
    InvalidInputContext, Result,
    router::BackendAdapter,
    types::{BackendType, DaReference, Submission},
};

pub struct NearDaService<Sidecar> {
    sidecar: Sidecar,
}

impl<Sidecar> NearDaService<Sidecar> {
    pub fn new(sidecar: Sidecar) -> Self {
        Self { sidecar }
    }
}

#[async_trait]
impl<Sidecar> BackendAdapter for NearDaService<Sidecar>
where
    Sidecar: Api + Send + Sync,
{
    async fn submit(&self, payload: Vec<u8>) -> Result<Submission> {
        let frame = self.sidecar.submit(payload).await?;
        info!("near da accepted frame {}", hex::encode(&frame));

        Ok(Submission::new(BackendType::NearDA, reference::to_base64(frame)))
    }

    async fn retrieve(&self, reference: DaReference) -> Result<Vec<u8>> {
        let bytes = reference::from_base64(reference.as_str())
            .invalid_input("malformed frame reference")?;
        let frame = FrameRef::new(bytes).invalid_input("malformed frame reference")?;
        debug!("fetching near da frame at index {}", frame.index());

        self.sidecar.get(frame).await
    }
}
