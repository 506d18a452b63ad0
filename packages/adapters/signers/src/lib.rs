use std::path::{Path, PathBuf};

pub mod das;
pub mod eth;
mod kms_utils;

pub use kms_utils::*;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("kms signer unavailable: {0}")]
    Kms(String),
    #[error("failed to read key file {0}: {1}")]
    KeyFile(String, #[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Where a signing key comes from, written as `Kms(<key id>)`,
/// `Private(<hex key>)` or `File(<path to a hex key>)` in configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySource {
    Kms(String),
    Private(String),
    File(PathBuf),
}

impl KeySource {
    pub fn is_kms(&self) -> bool {
        matches!(self, Self::Kms(_))
    }
}

/// Hex key stored in `path`, surrounding whitespace ignored.
fn read_key_file(path: &Path) -> Result<String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::KeyFile(path.display().to_string(), e))?;

    Ok(contents.trim().to_string())
}

impl<'a> serde::Deserialize<'a> for KeySource {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let value = String::deserialize(deserializer)?;
        if let Some(k) = value.strip_prefix("Kms(").and_then(|s| s.strip_suffix(')')) {
            Ok(KeySource::Kms(k.to_string()))
        } else if let Some(k) = value
            .strip_prefix("Private(")
            .and_then(|s| s.strip_suffix(')'))
        {
            Ok(KeySource::Private(k.to_string()))
        } else if let Some(path) = value.strip_prefix("File(").and_then(|s| s.strip_suffix(')')) {
            Ok(KeySource::File(PathBuf::from(path)))
        } else {
            Err(serde::de::Error::custom(
                "invalid KeySource format, expected `Kms(<key id>)`, `Private(<key>)` or `File(<path>)`",
            ))
        }
    }
}
