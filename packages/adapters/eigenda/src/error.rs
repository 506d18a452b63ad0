use tonic::Code;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[error("RPC error: {0}")]
    Rpc(#[from] tonic::Status),
    #[error("disperser rejected the blob: {0}")]
    Rejected(String),
    #[error("invalid disperser response: {0}")]
    InvalidResponse(String),
    #[error("invalid disperser url: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, Error>;

fn is_transient(code: Code) -> bool {
    matches!(
        code,
        Code::Unavailable | Code::DeadlineExceeded | Code::ResourceExhausted | Code::Aborted
    )
}

impl From<Error> for services::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Transport(_) => Self::Network(err.to_string()),
            Error::Rpc(ref status) if is_transient(status.code()) => {
                Self::Network(err.to_string())
            }
            _ => Self::Other(err.to_string()),
        }
    }
}
