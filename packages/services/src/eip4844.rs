use async_trait::async_trait;
use da_gateway_encoding::{blob, reference};
use tracing::{info, warn};

use crate::{
    Error, InvalidInputContext, Result,
    eth_tx::{fetch_batch_tx, intrinsic_gas, send_candidate},
    ports::{beacon, l1},
    router::BackendAdapter,
    types::{
        BackendType, BlobTxCandidate, DaReference, DataSourceConfig, Submission,
    },
};

/// How payloads are carried by the batch inbox transaction. Fixed per
/// deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carrier {
    Blobs,
    Calldata,
}

pub struct Eip4844Service<L1, Beacon> {
    l1: L1,
    beacon: Beacon,
    data_source: DataSourceConfig,
    carrier: Carrier,
}

impl<L1, Beacon> Eip4844Service<L1, Beacon>
where
    L1: l1::Api,
{
    pub fn new(l1: L1, beacon: Beacon, data_source: DataSourceConfig, carrier: Carrier) -> Self {
        if l1.sender() != data_source.batcher_address {
            warn!(
                "signer {} is not the batcher {}, submitted transactions will not be retrievable",
                l1.sender(),
                data_source.batcher_address
            );
        }

        Self {
            l1,
            beacon,
            data_source,
            carrier,
        }
    }
}

#[async_trait]
impl<L1, Beacon> BackendAdapter for Eip4844Service<L1, Beacon>
where
    L1: l1::Api + Send + Sync,
    Beacon: beacon::Api + Send + Sync,
{
    async fn submit(&self, payload: Vec<u8>) -> Result<Submission> {
        let to = self.data_source.batch_inbox_address;
        let gas_limit = intrinsic_gas(&payload);
        let size = payload.len();

        let candidate = match self.carrier {
            Carrier::Blobs => {
                let blob = blob::encode(&payload).invalid_input("payload does not fit a blob")?;
                BlobTxCandidate::blobs(to, vec![blob])
            }
            Carrier::Calldata => BlobTxCandidate::calldata(to, payload),
        }
        .with_gas_limit(gas_limit);

        let hash = send_candidate(&self.l1, candidate).await?;
        let reference = reference::to_prefixed_hex(hash);
        info!("sent {size} bytes as {:?} in transaction {reference}", self.carrier);

        Ok(Submission::new(BackendType::Eip4844, reference))
    }

    async fn retrieve(&self, reference: DaReference) -> Result<Vec<u8>> {
        let tx = fetch_batch_tx(&self.l1, &self.data_source, &reference).await?;

        if tx.blob_versioned_hashes.is_empty() {
            return Err(Error::InvalidInput(format!(
                "no blob data in transaction {reference}"
            )));
        }

        let block = self
            .l1
            .inclusion_block(tx.hash)
            .await?
            .ok_or_else(|| Error::StillPending(format!("transaction {reference} not yet included")))?;
        let header = self
            .l1
            .header_by_number(block)
            .await?
            .ok_or_else(|| Error::Other(format!("no header for block {block}")))?;

        let blobs = self.beacon.blobs(header, tx.blob_versioned_hashes).await?;
        let first = blobs
            .first()
            .ok_or_else(|| Error::Other(format!("beacon returned no blobs for {reference}")))?;

        blob::decode(first).invalid_input("blob does not hold a batch")
    }
}
