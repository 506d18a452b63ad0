use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use da_gateway_encoding::reference;
use tracing::info;

use super::port::{Clock, Reader, Writer};
use crate::{
    Error, InvalidInputContext, Result,
    router::BackendAdapter,
    types::{BackendType, DaReference, Submission},
};

pub struct AnyTrustService<W, R, C> {
    writer: W,
    reader: R,
    clock: C,
    retention: Duration,
}

impl<W, R, C> AnyTrustService<W, R, C> {
    pub fn new(writer: W, reader: R, clock: C, retention: Duration) -> Self {
        Self {
            writer,
            reader,
            clock,
            retention,
        }
    }
}

impl<W, R, C> AnyTrustService<W, R, C>
where
    C: Clock,
{
    fn expiry(&self) -> Result<u64> {
        let now = self
            .clock
            .now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::Other(format!("clock is before the unix epoch: {e}")))?;

        Ok((now + self.retention).as_secs())
    }
}

#[async_trait]
impl<W, R, C> BackendAdapter for AnyTrustService<W, R, C>
where
    W: Writer + Send + Sync,
    R: Reader + Send + Sync,
    C: Clock + Send + Sync,
{
    async fn submit(&self, payload: Vec<u8>) -> Result<Submission> {
        let timeout = self.expiry()?;
        let size = payload.len();

        let certificate = self.writer.store(payload, timeout).await?;
        let data_hash = reference::to_prefixed_hex(certificate.data_hash);
        info!(
            "das committee stored {size} bytes as {data_hash}, signers mask {:#b}",
            certificate.signers_mask
        );

        Ok(Submission::new(BackendType::AnyTrust, data_hash)
            .with_certificate(reference::to_base64(certificate.serialize())))
    }

    /// `reference` may be the `0x` prefixed hex or the base64 encoding of the
    /// data hash.
    async fn retrieve(&self, reference: DaReference) -> Result<Vec<u8>> {
        let data_hash =
            reference::parse_hash(reference.as_str()).invalid_input("malformed data hash")?;

        self.reader.get_by_hash(data_hash).await
    }
}
