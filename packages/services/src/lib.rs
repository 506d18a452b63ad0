pub mod anytrust;
pub mod celestia;
pub mod eigenda;
pub mod eip4844;
pub mod eth_tx;
mod health_reporter;
pub mod lifecycle;
pub mod nearda;
pub mod poller;
pub mod ports;
pub mod router;
pub mod types;

pub use health_reporter::{HealthReport, HealthReporter};
pub use lifecycle::{Lifecycle, State};
pub use poller::{ConfirmationPoller, Poll};
pub use router::{Adapters, AwaitsConfirmation, BackendAdapter, DispatchRouter};

use serde::Serialize;
use types::BackendType;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown backend type {0}, expected a value in [0, 4]")]
    UnknownBackendType(i64),
    #[error("{0} backend is not prepared")]
    BackendNotPrepared(BackendType),
    #[error("{backend} submission failed: {source}")]
    SubmissionFailed {
        backend: BackendType,
        #[source]
        source: Box<Error>,
    },
    #[error("{backend} retrieval failed: {source}")]
    RetrievalFailed {
        backend: BackendType,
        #[source]
        source: Box<Error>,
    },
    #[error("still pending: {0}")]
    StillPending(String),
    #[error("permanent backend failure: {0}")]
    PermanentBackendFailure(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("cancelled")]
    Cancelled,
    #[error("dispatcher is not running")]
    NotRunning,
    #[error("already stopped")]
    AlreadyStopped,
    #[error("Network error: {0}")]
    Network(String),
    #[error("{0}")]
    Other(String),
}

/// Stable classification of an [`Error`], suitable for transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    UnknownBackendType,
    BackendNotPrepared,
    SubmissionFailed,
    RetrievalFailed,
    StillPending,
    PermanentBackendFailure,
    Timeout,
    Cancelled,
    NotRunning,
    AlreadyStopped,
    Network,
    Other,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::UnknownBackendType => "unknown_backend_type",
            Self::BackendNotPrepared => "backend_not_prepared",
            Self::SubmissionFailed => "submission_failed",
            Self::RetrievalFailed => "retrieval_failed",
            Self::StillPending => "still_pending",
            Self::PermanentBackendFailure => "permanent_backend_failure",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::NotRunning => "not_running",
            Self::AlreadyStopped => "already_stopped",
            Self::Network => "network",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::UnknownBackendType(_) => ErrorKind::UnknownBackendType,
            Self::BackendNotPrepared(_) => ErrorKind::BackendNotPrepared,
            Self::SubmissionFailed { .. } => ErrorKind::SubmissionFailed,
            Self::RetrievalFailed { .. } => ErrorKind::RetrievalFailed,
            Self::StillPending(_) => ErrorKind::StillPending,
            Self::PermanentBackendFailure(_) => ErrorKind::PermanentBackendFailure,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::NotRunning => ErrorKind::NotRunning,
            Self::AlreadyStopped => ErrorKind::AlreadyStopped,
            Self::Network(_) => ErrorKind::Network,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether the failure came from talking to a remote service rather than
    /// from the request itself.
    pub fn is_network(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::SubmissionFailed { source, .. } | Self::RetrievalFailed { source, .. } => {
                source.is_network()
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Codec failures surface as [`Error::InvalidInput`].
pub(crate) trait InvalidInputContext<T> {
    fn invalid_input(self, context: &str) -> Result<T>;
}

impl<T> InvalidInputContext<T> for anyhow::Result<T> {
    fn invalid_input(self, context: &str) -> Result<T> {
        self.map_err(|e| Error::InvalidInput(format!("{context}: {e:#}")))
    }
}
