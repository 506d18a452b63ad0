use services::types::{self, BlobStatusReply};
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::debug;
use url::Url;

use crate::{
    bindings::{
        self, BlobStatus, BlobStatusRequest, DisperseBlobRequest, RetrieveBlobRequest,
        disperser_client::DisperserClient,
    },
    error::{Error, Result},
};

/// Retrieved blobs may exceed tonic's 4 MiB default.
const MAX_DECODING_MESSAGE_SIZE: usize = 32 * 1024 * 1024;

/// gRPC client of an EigenDA disperser.
#[derive(Debug, Clone)]
pub struct DisperserGrpc {
    client: DisperserClient<Channel>,
}

impl DisperserGrpc {
    /// Connects lazily. `https` endpoints use the platform's root certificates.
    pub fn new(url: &Url) -> Result<Self> {
        let mut endpoint = Endpoint::from_shared(url.to_string())
            .map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        if url.scheme() == "https" {
            endpoint = endpoint.tls_config(ClientTlsConfig::new().with_native_roots())?;
        }

        let client = DisperserClient::new(endpoint.connect_lazy())
            .max_decoding_message_size(MAX_DECODING_MESSAGE_SIZE);

        Ok(Self { client })
    }

    async fn disperse(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        let size = data.len();
        let reply = self
            .client
            .clone()
            .disperse_blob(DisperseBlobRequest {
                data,
                custom_quorum_numbers: vec![],
                account_id: String::new(),
            })
            .await?
            .into_inner();

        let request_id = accepted_request_id(reply)?;
        debug!(
            "dispersed {size} bytes to eigenda, request id {}",
            hex::encode(&request_id)
        );

        Ok(request_id)
    }

    async fn status(&self, request_id: Vec<u8>) -> Result<BlobStatusReply> {
        let reply = self
            .client
            .clone()
            .get_blob_status(BlobStatusRequest { request_id })
            .await?
            .into_inner();

        convert_status_reply(reply)
    }

    async fn retrieve(&self, batch_header_hash: Vec<u8>, blob_index: u32) -> Result<Vec<u8>> {
        debug!(
            "retrieving blob {blob_index} of batch {}",
            hex::encode(&batch_header_hash)
        );

        let reply = self
            .client
            .clone()
            .retrieve_blob(RetrieveBlobRequest {
                batch_header_hash,
                blob_index,
            })
            .await?
            .into_inner();

        Ok(reply.data)
    }
}

fn blob_status(raw: i32) -> Result<BlobStatus> {
    BlobStatus::try_from(raw)
        .map_err(|_| Error::InvalidResponse(format!("unknown blob status {raw}")))
}

fn accepted_request_id(reply: bindings::DisperseBlobReply) -> Result<Vec<u8>> {
    match blob_status(reply.result)? {
        BlobStatus::Unknown | BlobStatus::Failed => Err(Error::Rejected(format!(
            "dispersal reply status is {}",
            reply.result
        ))),
        _ if reply.request_id.is_empty() => Err(Error::InvalidResponse(
            "dispersal reply carries no request id".to_string(),
        )),
        _ => Ok(reply.request_id),
    }
}

impl From<BlobStatus> for types::BlobStatus {
    fn from(status: BlobStatus) -> Self {
        match status {
            BlobStatus::Unknown => Self::Unknown,
            BlobStatus::Processing | BlobStatus::Dispersing => Self::Processing,
            BlobStatus::Confirmed => Self::Confirmed,
            BlobStatus::Finalized => Self::Finalized,
            BlobStatus::Failed | BlobStatus::InsufficientSignatures => Self::Failed,
        }
    }
}

fn convert_status_reply(reply: bindings::BlobStatusReply) -> Result<BlobStatusReply> {
    let status = types::BlobStatus::from(blob_status(reply.status)?);
    if !status.is_available() {
        return Ok(BlobStatusReply { status, info: None });
    }

    let proof = reply
        .info
        .and_then(|info| info.blob_verification_proof)
        .ok_or_else(|| {
            Error::InvalidResponse(format!("{status:?} blob without verification proof"))
        })?;
    let metadata = proof
        .batch_metadata
        .ok_or_else(|| Error::InvalidResponse(format!("{status:?} blob without batch metadata")))?;

    Ok(BlobStatusReply {
        status,
        info: Some(types::BlobInfo {
            batch_header_hash: metadata.batch_header_hash,
            blob_index: proof.blob_index,
        }),
    })
}

impl services::eigenda::port::Api for DisperserGrpc {
    async fn disperse_blob(&self, data: Vec<u8>) -> services::Result<Vec<u8>> {
        Ok(self.disperse(data).await?)
    }

    async fn blob_status(&self, request_id: Vec<u8>) -> services::Result<BlobStatusReply> {
        Ok(self.status(request_id).await?)
    }

    async fn retrieve_blob(
        &self,
        batch_header_hash: Vec<u8>,
        blob_index: u32,
    ) -> services::Result<Vec<u8>> {
        Ok(self.retrieve(batch_header_hash, blob_index).await?)
    }
}
