use da_gateway_encoding::reference;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

/// REST client of a DAS mirror.
#[derive(Clone)]
pub struct RestReader {
    client: reqwest::Client,
    url: Url,
}

#[derive(Deserialize)]
struct GetByHashResponse {
    data: String,
}

impl RestReader {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    async fn fetch(&self, data_hash: [u8; 32]) -> Result<Vec<u8>> {
        let url = self
            .url
            .join(&format!("get-by-hash/{}", hex::encode(data_hash)))?;

        let response: GetByHashResponse = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        reference::from_base64(&response.data)
            .map_err(|e| Error::InvalidResponse(format!("data is not base64: {e}")))
    }
}

impl services::anytrust::port::Reader for RestReader {
    async fn get_by_hash(&self, data_hash: [u8; 32]) -> services::Result<Vec<u8>> {
        Ok(self.fetch(data_hash).await?)
    }
}
