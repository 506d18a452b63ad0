use alloy::{
    rpc::client::{ClientBuilder, RpcClient},
    transports::http::Http,
};
use da_gateway_encoding::reference;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Lets the node estimate the gas price.
const DEFAULT_GAS_PRICE: f64 = -1.0;

/// JSON-RPC client of a Celestia DA proxy, bound to one namespace.
#[derive(Clone)]
pub struct DaProxyClient {
    client: RpcClient,
    namespace: Vec<u8>,
}

impl DaProxyClient {
    /// `namespace` is hex encoded. An empty `auth_token` sends no
    /// authorization header.
    pub fn new(url: Url, auth_token: &str, namespace: &str) -> Result<Self> {
        let namespace =
            hex::decode(namespace).map_err(|e| Error::InvalidNamespace(e.to_string()))?;

        let mut headers = HeaderMap::new();
        if !auth_token.is_empty() {
            let mut value = HeaderValue::from_str(&format!("Bearer {auth_token}"))
                .map_err(|e| Error::Other(format!("auth token is not a valid header: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        let client = ClientBuilder::default().transport(Http::with_client(http, url), false);

        Ok(Self { client, namespace })
    }

    pub fn namespace(&self) -> &[u8] {
        &self.namespace
    }

    async fn submit_blobs(&self, blobs: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>> {
        let count = blobs.len();
        let blobs: Vec<Base64> = blobs.into_iter().map(Base64).collect();

        let ids: Vec<Base64> = self
            .client
            .request(
                "da.Submit",
                (blobs, DEFAULT_GAS_PRICE, Base64(self.namespace.clone())),
            )
            .await?;
        debug!("da.Submit of {count} blobs returned {} ids", ids.len());

        Ok(ids.into_iter().map(|Base64(id)| id).collect())
    }

    async fn get_blobs(&self, ids: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>> {
        let ids: Vec<Base64> = ids.into_iter().map(Base64).collect();

        let blobs: Option<Vec<Base64>> = self
            .client
            .request("da.Get", (ids, Base64(self.namespace.clone())))
            .await?;

        Ok(blobs
            .unwrap_or_default()
            .into_iter()
            .map(|Base64(blob)| blob)
            .collect())
    }
}

impl services::celestia::port::Api for DaProxyClient {
    async fn submit(&self, blobs: Vec<Vec<u8>>) -> services::Result<Vec<Vec<u8>>> {
        Ok(self.submit_blobs(blobs).await?)
    }

    async fn get(&self, ids: Vec<Vec<u8>>) -> services::Result<Vec<Vec<u8>>> {
        Ok(self.get_blobs(ids).await?)
    }
}

/// Byte strings travel as standard base64 in the proxy's JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Base64(Vec<u8>);

impl Serialize for Base64 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&reference::to_base64(&self.0))
    }
}

impl<'de> Deserialize<'de> for Base64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        reference::from_base64(&value)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}
