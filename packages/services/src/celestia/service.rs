use std::time::Duration;

use async_trait::async_trait;
use da_gateway_encoding::{
    celestia::{MarkerData, decode_marker, encode_marker},
    reference,
};
use tracing::{info, warn};

use super::port;
use crate::{
    Error, Result,
    eth_tx::{fetch_batch_tx, intrinsic_gas, send_candidate},
    ports::l1,
    router::BackendAdapter,
    types::{BackendType, BlobTxCandidate, DaReference, DataSourceConfig, Submission},
};

/// Blocks a submission may take to be accepted by Celestia.
pub const SUBMIT_TIMEOUT_BLOCKS: u32 = 30;

pub struct CelestiaService<L1, Da> {
    l1: L1,
    da: Da,
    data_source: DataSourceConfig,
    eth_fallback_disabled: bool,
    submit_timeout: Duration,
}

impl<L1, Da> CelestiaService<L1, Da> {
    pub fn new(
        l1: L1,
        da: Da,
        data_source: DataSourceConfig,
        eth_fallback_disabled: bool,
        block_time: Duration,
    ) -> Self {
        Self {
            l1,
            da,
            data_source,
            eth_fallback_disabled,
            submit_timeout: block_time * SUBMIT_TIMEOUT_BLOCKS,
        }
    }

    /// Shortens the wait for Celestia so that an l1 send bounded by
    /// `l1_send_timeout` still completes within `request_timeout`.
    pub fn within_request_timeout(
        mut self,
        request_timeout: Duration,
        l1_send_timeout: Duration,
    ) -> Self {
        let budget = request_timeout.saturating_sub(l1_send_timeout);
        if budget < self.submit_timeout {
            info!(
                "celestia submissions limited to {} to leave room for the l1 transaction",
                humantime::format_duration(budget)
            );
            self.submit_timeout = budget;
        }

        self
    }
}

impl<L1, Da> CelestiaService<L1, Da>
where
    Da: port::Api + Sync,
{
    async fn submit_blob(&self, payload: Vec<u8>) -> Result<Vec<u8>> {
        let mut ids = tokio::time::timeout(self.submit_timeout, self.da.submit(vec![payload]))
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "celestia did not accept the blob within {}",
                    humantime::format_duration(self.submit_timeout)
                ))
            })??;

        match ids.len() {
            1 => Ok(ids.swap_remove(0)),
            n => Err(Error::Other(format!("expected one blob id from celestia, got {n}"))),
        }
    }
}

#[async_trait]
impl<L1, Da> BackendAdapter for CelestiaService<L1, Da>
where
    L1: l1::Api + Send + Sync,
    Da: port::Api + Send + Sync,
{
    async fn submit(&self, payload: Vec<u8>) -> Result<Submission> {
        let calldata = match self.submit_blob(payload.clone()).await {
            Ok(id) => {
                info!("celestia accepted blob, id {}", hex::encode(&id));
                encode_marker(&id)
            }
            Err(e) if self.eth_fallback_disabled => return Err(e),
            Err(e) => {
                warn!("celestia submission failed, falling back to eth calldata: {e}");
                payload
            }
        };

        let gas_limit = intrinsic_gas(&calldata);
        let candidate = BlobTxCandidate::calldata(self.data_source.batch_inbox_address, calldata)
            .with_gas_limit(gas_limit);
        let hash = send_candidate(&self.l1, candidate).await?;

        Ok(Submission::new(
            BackendType::Celestia,
            reference::to_prefixed_hex(hash),
        ))
    }

    async fn retrieve(&self, reference: DaReference) -> Result<Vec<u8>> {
        let tx = fetch_batch_tx(&self.l1, &self.data_source, &reference).await?;

        match decode_marker(&tx.input) {
            MarkerData::Empty => Ok(vec![]),
            MarkerData::EthFallback(data) => Ok(data.to_vec()),
            MarkerData::Celestia(id) => {
                let mut blobs = self.da.get(vec![id.to_vec()]).await?;
                match blobs.len() {
                    0 => {
                        warn!("celestia returned no blob for id {}", hex::encode(id));
                        Ok(vec![])
                    }
                    1 => Ok(blobs.swap_remove(0)),
                    n => {
                        warn!(
                            "celestia returned {n} blobs for id {}, using the first",
                            hex::encode(id)
                        );
                        Ok(blobs.swap_remove(0))
                    }
                }
            }
        }
    }
}
