use alloy::transports::{RpcError, TransportErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("network error: {msg}, recoverable: {recoverable}")]
    Network { msg: String, recoverable: bool },
    #[error("tx execution error: {0}")]
    TxExecution(String),
    #[error("other error: {0}")]
    Other(String),
}

impl From<RpcError<TransportErrorKind>> for Error {
    fn from(err: RpcError<TransportErrorKind>) -> Self {
        match err {
            RpcError::ErrorResp(err) if err.code >= -32613 && err.code <= -32000 => {
                Self::TxExecution(err.message.to_string())
            }
            RpcError::Transport(
                TransportErrorKind::BackendGone | TransportErrorKind::PubsubUnavailable,
            ) => Self::Network {
                msg: err.to_string(),
                recoverable: false,
            },
            _ => Self::Network {
                msg: err.to_string(),
                recoverable: true,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for services::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Network { msg, .. } => Self::Network(msg),
            Error::Other(err) | Error::TxExecution(err) => Self::Other(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::rpc::json_rpc::ErrorPayload;

    use super::*;

    #[test]
    fn correctly_detects_tx_execution_error() {
        for code in 32_000..=32_613 {
            let err = RpcError::ErrorResp(ErrorPayload {
                code: -code,
                message: "nonce too low".into(),
                data: None,
            });

            let our_error = Error::from(err);
            let Error::TxExecution(msg) = our_error else {
                panic!("Expected TxExecution got: {our_error}")
            };

            assert!(msg.contains("nonce too low"));
        }
    }

    #[test]
    fn rest_of_the_error_range_is_classified_as_network_caused() {
        for code in [31_999, 32_614] {
            let err = RpcError::ErrorResp(ErrorPayload {
                code: -code,
                message: "some message".into(),
                data: None,
            });

            let our_error = Error::from(err);
            let Error::Network { msg, recoverable } = our_error else {
                panic!("Expected Network got: {our_error}")
            };

            assert!(recoverable);
            assert!(msg.contains("some message"));
        }
    }

    #[test]
    fn backend_gone_is_irrecoverable() {
        let err = RpcError::Transport(TransportErrorKind::BackendGone);

        let our_error = Error::from(err);

        assert!(matches!(
            our_error,
            Error::Network {
                recoverable: false,
                ..
            }
        ));
    }

    #[test]
    fn only_network_errors_count_as_network_faults_upstream() {
        let network = services::Error::from(Error::Network {
            msg: "connection refused".to_string(),
            recoverable: true,
        });
        let execution = services::Error::from(Error::TxExecution("reverted".to_string()));

        assert!(network.is_network());
        assert!(!execution.is_network());
    }
}
