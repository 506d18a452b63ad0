use async_trait::async_trait;
use da_gateway_encoding::{eigenda, reference};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::port::Api;
use crate::{
    Error, InvalidInputContext, Result,
    poller::{ConfirmationPoller, Poll},
    router::{AwaitsConfirmation, BackendAdapter},
    types::{BackendType, BlobInfo, BlobStatus, BlobStatusReply, BlobVerification, DaReference, Submission},
};

pub struct EigenDaService<D> {
    disperser: D,
    poller: ConfirmationPoller,
}

impl<D> EigenDaService<D> {
    pub fn new(disperser: D, poller: ConfirmationPoller) -> Self {
        Self { disperser, poller }
    }
}

impl<D> EigenDaService<D>
where
    D: Api + Send + Sync,
{
    async fn disperse(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let padded = eigenda::convert_by_padding_empty_byte(payload);
        let request_id = self.disperser.disperse_blob(padded).await?;
        info!(
            "dispersed {} bytes to eigenda, request id {}",
            payload.len(),
            hex::encode(&request_id)
        );

        Ok(request_id)
    }

    async fn fetch_confirmed(&self, info: BlobInfo) -> Result<Vec<u8>> {
        let padded = self
            .disperser
            .retrieve_blob(info.batch_header_hash, info.blob_index)
            .await?;

        Ok(eigenda::remove_empty_byte_from_padded_bytes(&padded))
    }
}

fn confirmed_info(reply: BlobStatusReply) -> Result<BlobInfo> {
    reply
        .info
        .ok_or_else(|| Error::Other(format!("blob is {:?} but carries no batch info", reply.status)))
}

fn terminal_failure(request_id: &[u8], status: BlobStatus) -> Error {
    Error::PermanentBackendFailure(format!(
        "eigenda request {} ended in status {status:?}",
        hex::encode(request_id)
    ))
}

#[async_trait]
impl<D> BackendAdapter for EigenDaService<D>
where
    D: Api + Send + Sync,
{
    async fn submit(&self, payload: Vec<u8>) -> Result<Submission> {
        let request_id = self.disperse(&payload).await?;

        Ok(Submission::new(
            BackendType::EigenDA,
            reference::to_base64(request_id),
        ))
    }

    async fn retrieve(&self, reference: DaReference) -> Result<Vec<u8>> {
        let request_id =
            reference::from_base64(reference.as_str()).invalid_input("malformed eigenda request id")?;

        let reply = self.disperser.blob_status(request_id.clone()).await?;
        debug!("eigenda request {reference} is {:?}", reply.status);

        match reply.status {
            BlobStatus::Confirmed | BlobStatus::Finalized => {
                let info = confirmed_info(reply)?;
                self.fetch_confirmed(info).await
            }
            BlobStatus::Failed | BlobStatus::Unknown => {
                Err(terminal_failure(&request_id, reply.status))
            }
            BlobStatus::Processing => Err(Error::StillPending(format!(
                "eigenda request {reference} is still processing"
            ))),
        }
    }
}

#[async_trait]
impl<D> AwaitsConfirmation for EigenDaService<D>
where
    D: Api + Send + Sync,
{
    async fn disperse_and_wait(
        &self,
        payload: Vec<u8>,
        cancel: CancellationToken,
    ) -> Result<BlobVerification> {
        let request_id = self.disperse(&payload).await?;

        let (status, info) = self
            .poller
            .poll(&cancel, || {
                let request_id = request_id.clone();
                async move {
                    let reply = self.disperser.blob_status(request_id.clone()).await?;
                    match reply.status {
                        BlobStatus::Confirmed | BlobStatus::Finalized => {
                            let status = reply.status;
                            Ok(Poll::Ready((status, confirmed_info(reply)?)))
                        }
                        BlobStatus::Failed | BlobStatus::Unknown => {
                            Err(terminal_failure(&request_id, reply.status))
                        }
                        BlobStatus::Processing => Ok(Poll::Pending),
                    }
                }
            })
            .await?;

        info!(
            "eigenda request {} confirmed in batch {} at index {}",
            hex::encode(&request_id),
            hex::encode(&info.batch_header_hash),
            info.blob_index
        );

        Ok(BlobVerification {
            request_id,
            status,
            info,
        })
    }
}
