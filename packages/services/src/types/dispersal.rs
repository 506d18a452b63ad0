use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlobStatus {
    Unknown,
    Processing,
    Confirmed,
    Finalized,
    Failed,
}

impl BlobStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Finalized)
    }

    pub fn is_permanent_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Unknown)
    }
}

/// Location of a confirmed blob within an EigenDA batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobInfo {
    pub batch_header_hash: Vec<u8>,
    pub blob_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobStatusReply {
    pub status: BlobStatus,
    /// Present once the blob was confirmed.
    pub info: Option<BlobInfo>,
}

impl BlobStatusReply {
    pub fn pending() -> Self {
        Self {
            status: BlobStatus::Processing,
            info: None,
        }
    }
}

/// What a caller gets back after waiting for a dispersal to be confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobVerification {
    pub request_id: Vec<u8>,
    pub status: BlobStatus,
    pub info: BlobInfo,
}
