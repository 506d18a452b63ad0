use async_trait::async_trait;
use da_gateway_encoding::anytrust::{Certificate, store_signing_hash};
use delegate::delegate;

use crate::{Result, error::Error, writer::RpcWriter};

/// Produces 65 byte recoverable secp256k1 signatures, `r || s || v`.
#[async_trait]
pub trait Sign: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn sign_digest(&self, digest: [u8; 32]) -> std::result::Result<[u8; 65], Self::Error>;
}

/// Writer for committees that only accept stores signed by a known key.
pub struct SigningWriter<S> {
    inner: RpcWriter,
    signer: S,
}

impl<S> SigningWriter<S> {
    pub fn new(inner: RpcWriter, signer: S) -> Self {
        Self { inner, signer }
    }

    delegate! {
        to self.inner {
            pub async fn health_check(&self) -> Result<()>;
        }
    }
}

impl<S> services::anytrust::port::Writer for SigningWriter<S>
where
    S: Sign,
{
    async fn store(&self, message: Vec<u8>, timeout: u64) -> services::Result<Certificate> {
        let digest = store_signing_hash(&message, timeout);
        let sig = self
            .signer
            .sign_digest(digest)
            .await
            .map_err(|e| Error::Signing(e.to_string()))?;

        Ok(self.inner.store_signed(message, timeout, sig.to_vec()).await?)
    }
}
