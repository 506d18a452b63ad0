use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The DA backends a payload can be routed to. The discriminant is the tag
/// used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum BackendType {
    AnyTrust = 0,
    Celestia = 1,
    EigenDA = 2,
    Eip4844 = 3,
    NearDA = 4,
}

impl BackendType {
    pub const ALL: [Self; 5] = [
        Self::AnyTrust,
        Self::Celestia,
        Self::EigenDA,
        Self::Eip4844,
        Self::NearDA,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnyTrust => "anytrust",
            Self::Celestia => "celestia",
            Self::EigenDA => "eigenda",
            Self::Eip4844 => "eip4844",
            Self::NearDA => "nearda",
        }
    }
}

impl Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i64> for BackendType {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::AnyTrust),
            1 => Ok(Self::Celestia),
            2 => Ok(Self::EigenDA),
            3 => Ok(Self::Eip4844),
            4 => Ok(Self::NearDA),
            other => Err(Error::UnknownBackendType(other)),
        }
    }
}

impl From<BackendType> for i64 {
    fn from(value: BackendType) -> Self {
        value as i64
    }
}

/// Opaque handle returned by a submission. Only the backend that produced it
/// knows how to interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaReference(String);

impl DaReference {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DaReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DaReference {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DaReference {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub backend: BackendType,
    pub reference: DaReference,
    /// Base64 encoded certificate, only produced by AnyTrust.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
}

impl Submission {
    pub fn new(backend: BackendType, reference: impl Into<DaReference>) -> Self {
        Self {
            backend,
            reference: reference.into(),
            certificate: None,
        }
    }

    pub fn with_certificate(mut self, certificate: String) -> Self {
        self.certificate = Some(certificate);
        self
    }
}
