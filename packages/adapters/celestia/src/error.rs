use alloy::transports::{RpcError, TransportErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(String),
    #[error("celestia rejected the request: {0}")]
    Rejected(String),
    #[error("invalid celestia response: {0}")]
    InvalidResponse(String),
    #[error("invalid namespace: {0}")]
    InvalidNamespace(String),
    #[error("{0}")]
    Other(String),
}

impl From<RpcError<TransportErrorKind>> for Error {
    fn from(err: RpcError<TransportErrorKind>) -> Self {
        match err {
            RpcError::ErrorResp(payload) => Self::Rejected(payload.to_string()),
            RpcError::DeserError { .. } | RpcError::NullResp => {
                Self::InvalidResponse(err.to_string())
            }
            RpcError::Transport(TransportErrorKind::HttpError(ref http))
                if http.status == 401 || http.status == 403 =>
            {
                Self::Rejected(format!("unauthorized, check the auth token: {err}"))
            }
            _ => Self::Network(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Other(format!("failed to build http client: {err}"))
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

#[cfg(test)]
mod tests {
    use alloy::{rpc::json_rpc::ErrorPayload, transports::HttpError};

    use super::*;

    #[test]
    fn unauthorized_is_not_retried_as_an_outage() {
        let err = Error::from(RpcError::Transport(TransportErrorKind::HttpError(
            HttpError {
                status: 401,
                body: "unauthorized".to_string(),
            },
        )));

        assert!(matches!(err, Error::Rejected(_)));
    }

    #[test]
    fn server_errors_are_network_faults() {
        let err = Error::from(RpcError::Transport(TransportErrorKind::HttpError(
            HttpError {
                status: 502,
                body: "bad gateway".to_string(),
            },
        )));

        assert!(services::Error::from(err).is_network());
    }

    #[test]
    fn error_responses_keep_the_node_message() {
        let err = Error::from(RpcError::ErrorResp(ErrorPayload {
            code: 1,
            message: "blob size exceeds the maximum".into(),
            data: None,
        }));

        let upstream = services::Error::from(err);

        assert!(!upstream.is_network());
        assert!(upstream.to_string().contains("blob size exceeds the maximum"));
    }
}
