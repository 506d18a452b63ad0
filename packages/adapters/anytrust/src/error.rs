use alloy::transports::{RpcError, TransportErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(String),
    #[error("das rejected the request: {0}")]
    Rejected(String),
    #[error("invalid das response: {0}")]
    InvalidResponse(String),
    #[error("failed to sign store request: {0}")]
    Signing(String),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<RpcError<TransportErrorKind>> for Error {
    fn from(err: RpcError<TransportErrorKind>) -> Self {
        match err {
            RpcError::ErrorResp(payload) => Self::Rejected(payload.to_string()),
            RpcError::DeserError { .. } | RpcError::NullResp => {
                Self::InvalidResponse(err.to_string())
            }
            _ => Self::Network(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if err.status().is_some_and(|status| status.is_client_error()) {
            Self::Rejected(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for services::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Network(msg) => Self::Network(msg),
            other => Self::Other(other.to_string()),
        }
    }
}
