use serde::{Deserialize, Serialize, de::DeserializeOwned};
use services::{ErrorKind, types::Submission};
use tokio_util::{bytes::Bytes, codec::LengthDelimitedCodec};

/// Upper bound on a single frame, comfortably above the largest payload any
/// backend accepts once base64 encoded.
pub const MAX_FRAME_LENGTH: usize = 64 * 1024 * 1024;

/// `da_type` stays a raw integer so that unknown tags reach the gateway and
/// are answered with `unknown_backend_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Request {
    /// `data` is base64 encoded.
    Submit { da_type: i64, data: String },
    Retrieve { da_type: i64, reference: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    Submitted(Submission),
    /// `data` is base64 encoded.
    Retrieved { data: String },
    Error { kind: ErrorKind, message: String },
}

impl Response {
    pub fn error(err: &services::Error) -> Self {
        Self::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

pub fn codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .big_endian()
        .max_frame_length(MAX_FRAME_LENGTH)
        .new_codec()
}

pub fn encode<T: Serialize>(message: &T) -> serde_json::Result<Bytes> {
    serde_json::to_vec(message).map(Bytes::from)
}

pub fn decode<T: DeserializeOwned>(frame: &[u8]) -> serde_json::Result<T> {
    serde_json::from_slice(frame)
}
