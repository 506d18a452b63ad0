use alloy::{
    primitives::{Bytes, U64},
    rpc::client::{ClientBuilder, RpcClient},
};
use da_gateway_encoding::anytrust::{BLS_SIGNATURE_LEN, Certificate};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// JSON-RPC client of a DAS committee aggregator.
#[derive(Clone)]
pub struct RpcWriter {
    client: RpcClient,
}

impl RpcWriter {
    pub fn new(url: Url) -> Self {
        Self {
            client: ClientBuilder::default().http(url),
        }
    }

    pub async fn health_check(&self) -> Result<()> {
        self.client.request_noparams::<()>("das_healthCheck").await?;

        Ok(())
    }

    /// `sig` may be empty when the committee accepts unsigned stores.
    pub async fn store_signed(
        &self,
        message: Vec<u8>,
        timeout: u64,
        sig: Vec<u8>,
    ) -> Result<Certificate> {
        debug!(
            "das_store of {} bytes until {timeout}, signed: {}",
            message.len(),
            !sig.is_empty()
        );

        let result: StoreResult = self
            .client
            .request(
                "das_store",
                (Bytes::from(message), U64::from(timeout), Bytes::from(sig)),
            )
            .await?;

        result.try_into()
    }
}

impl services::anytrust::port::Writer for RpcWriter {
    async fn store(&self, message: Vec<u8>, timeout: u64) -> services::Result<Certificate> {
        Ok(self.store_signed(message, timeout, vec![]).await?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreResult {
    keyset_hash: Bytes,
    data_hash: Bytes,
    timeout: U64,
    signers_mask: U64,
    sig: Bytes,
    version: U64,
}

fn fixed<const N: usize>(field: &str, bytes: &Bytes) -> Result<[u8; N]> {
    bytes.as_ref().try_into().map_err(|_| {
        Error::InvalidResponse(format!(
            "{field} has {} bytes, expected {N}",
            bytes.len()
        ))
    })
}

impl TryFrom<StoreResult> for Certificate {
    type Error = Error;

    fn try_from(result: StoreResult) -> Result<Self> {
        let version = u8::try_from(result.version.to::<u64>()).map_err(|_| {
            Error::InvalidResponse(format!("unsupported certificate version {}", result.version))
        })?;

        Ok(Certificate {
            keyset_hash: fixed("keysetHash", &result.keyset_hash)?,
            data_hash: fixed("dataHash", &result.data_hash)?,
            timeout: result.timeout.to(),
            signers_mask: result.signers_mask.to(),
            signature: fixed::<BLS_SIGNATURE_LEN>("sig", &result.sig)?,
            version,
        })
    }
}
