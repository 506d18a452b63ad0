use da_gateway_encoding::nearda::FrameRef;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// HTTP client of a NEAR DA sidecar. The sidecar holds the NEAR account and
/// namespace configuration.
#[derive(Clone)]
pub struct SidecarClient {
    client: reqwest::Client,
    url: Url,
}

#[derive(Debug, Serialize, Deserialize)]
struct Blob {
    #[serde(with = "hex")]
    data: Vec<u8>,
}

impl SidecarClient {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    pub async fn health_check(&self) -> Result<()> {
        self.client
            .get(self.url.join("health")?)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn submit_blob(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        let size = data.len();
        let transaction_id: String = self
            .client
            .post(self.url.join("blob")?)
            .json(&Blob { data })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let frame = hex::decode(transaction_id.trim_start_matches("0x"))
            .map_err(|e| Error::InvalidResponse(format!("frame reference is not hex: {e}")))?;
        debug!("sidecar posted {size} bytes as frame {}", hex::encode(&frame));

        Ok(frame)
    }

    async fn get_blob(&self, frame: FrameRef) -> Result<Vec<u8>> {
        let mut url = self.url.join("blob")?;
        url.query_pairs_mut()
            .append_pair("transaction_id", &hex::encode(frame.transaction_id()))
            .append_pair("index", &frame.index().to_string());

        let blob: Blob = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(blob.data)
    }
}

impl services::nearda::port::Api for SidecarClient {
    async fn submit(&self, data: Vec<u8>) -> services::Result<Vec<u8>> {
        Ok(self.submit_blob(data).await?)
    }

    async fn get(&self, frame: FrameRef) -> services::Result<Vec<u8>> {
        Ok(self.get_blob(frame).await?)
    }
}
