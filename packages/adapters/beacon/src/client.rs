use da_gateway_encoding::{
    blob::{self, Blob},
    reference,
};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use services::types::BlockHeader;
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

const GENESIS_METHOD: &str = "eth/v1/beacon/genesis";
const SPEC_METHOD: &str = "eth/v1/config/spec";
const SIDECARS_METHOD_PREFIX: &str = "eth/v1/beacon/blob_sidecars";

/// Maps execution block timestamps to beacon slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainTiming {
    pub genesis_time: u64,
    pub seconds_per_slot: u64,
}

impl ChainTiming {
    pub fn slot_at(&self, timestamp: u64) -> Result<u64> {
        if self.seconds_per_slot == 0 {
            return Err(Error::InvalidResponse(
                "beacon reports zero seconds per slot".to_string(),
            ));
        }

        let since_genesis = timestamp.checked_sub(self.genesis_time).ok_or_else(|| {
            Error::Other(format!(
                "block timestamp {timestamp} precedes beacon genesis {}",
                self.genesis_time
            ))
        })?;

        Ok(since_genesis / self.seconds_per_slot)
    }
}

/// Beacon node REST client. Chain timing is fetched once and cached.
pub struct BeaconClient {
    client: reqwest::Client,
    url: Url,
    timing: OnceCell<ChainTiming>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct Genesis {
    #[serde(deserialize_with = "decimal")]
    genesis_time: u64,
}

#[derive(Deserialize)]
struct Spec {
    #[serde(rename = "SECONDS_PER_SLOT", deserialize_with = "decimal")]
    seconds_per_slot: u64,
}

#[derive(Deserialize)]
struct Sidecar {
    #[serde(deserialize_with = "decimal")]
    index: u64,
    blob: String,
    kzg_commitment: String,
}

fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    let value = String::deserialize(deserializer)?;
    value.parse().map_err(serde::de::Error::custom)
}

impl BeaconClient {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            timing: OnceCell::new(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let envelope: Envelope<T> = self
            .client
            .get(self.url.join(path)?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(envelope.data)
    }

    pub async fn timing(&self) -> Result<ChainTiming> {
        let timing = self
            .timing
            .get_or_try_init(|| async {
                let genesis: Genesis = self.get(GENESIS_METHOD).await?;
                let spec: Spec = self.get(SPEC_METHOD).await?;

                Ok::<_, Error>(ChainTiming {
                    genesis_time: genesis.genesis_time,
                    seconds_per_slot: spec.seconds_per_slot,
                })
            })
            .await?;

        Ok(*timing)
    }

    /// All sidecars of `slot`. Sidecar indices count blobs across the
    /// whole block, so callers match them by commitment instead.
    async fn sidecars(&self, slot: u64) -> Result<Vec<Sidecar>> {
        self.get(&format!("{SIDECARS_METHOD_PREFIX}/{slot}")).await
    }

    async fn matching_blobs(
        &self,
        block: BlockHeader,
        versioned_hashes: Vec<[u8; 32]>,
    ) -> Result<Vec<Blob>> {
        let slot = self.timing().await?.slot_at(block.timestamp)?;
        let sidecars = self.sidecars(slot).await?;
        debug!(
            "beacon returned {} sidecars for slot {slot} of block {}",
            sidecars.len(),
            block.number
        );

        let hashed = sidecars
            .iter()
            .map(|sidecar| Ok((sidecar.versioned_hash()?, sidecar)))
            .collect::<Result<Vec<_>>>()?;

        versioned_hashes
            .iter()
            .map(|wanted| {
                let (_, sidecar) = hashed
                    .iter()
                    .find(|(hash, _)| hash == wanted)
                    .ok_or_else(|| {
                        Error::Other(format!(
                            "no blob sidecar in slot {slot} matches versioned hash {}",
                            reference::to_prefixed_hex(wanted)
                        ))
                    })?;

                sidecar.blob()
            })
            .collect()
    }
}

impl Sidecar {
    fn versioned_hash(&self) -> Result<[u8; 32]> {
        let commitment: [u8; 48] = reference::from_prefixed_hex(&self.kzg_commitment)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| {
                Error::InvalidResponse(format!(
                    "sidecar {} carries a malformed kzg commitment",
                    self.index
                ))
            })?;

        Ok(blob::versioned_hash(&commitment))
    }

    fn blob(&self) -> Result<Blob> {
        let bytes = reference::from_prefixed_hex(&self.blob)
            .map_err(|e| Error::InvalidResponse(format!("sidecar {}: {e}", self.index)))?;
        let len = bytes.len();

        bytes.into_boxed_slice().try_into().map_err(|_| {
            Error::InvalidResponse(format!("sidecar {} holds a {len} byte blob", self.index))
        })
    }
}

impl services::ports::beacon::Api for BeaconClient {
    async fn blobs(
        &self,
        block: BlockHeader,
        versioned_hashes: Vec<[u8; 32]>,
    ) -> services::Result<Vec<Blob>> {
        Ok(self.matching_blobs(block, versioned_hashes).await?)
    }
}
