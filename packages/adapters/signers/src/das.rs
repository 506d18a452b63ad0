use async_trait::async_trait;
use k256::ecdsa::VerifyingKey;

use crate::{KeySource, load_config_from_env, read_key_file};

pub mod kms;
pub mod private_key;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Kms(#[from] kms::Error),
    #[error(transparent)]
    PrivateKey(#[from] private_key::Error),
    #[error(transparent)]
    KeySource(#[from] crate::Error),
}

/// Signs DAS store requests.
#[derive(Debug, Clone)]
pub enum Signer {
    Private(private_key::Signer),
    Kms(kms::Signer),
}

impl Signer {
    pub async fn from_key_source(source: &KeySource) -> Result<Self, Error> {
        match source {
            KeySource::Private(key) => Ok(Self::Private(private_key::Signer::from_hex(key)?)),
            KeySource::File(path) => Ok(Self::Private(private_key::Signer::from_hex(
                &read_key_file(path)?,
            )?)),
            KeySource::Kms(key_id) => {
                let config = load_config_from_env().await;
                let client = aws_sdk_kms::Client::new(&config);

                Ok(Self::Kms(kms::Signer::new(client, key_id.clone()).await?))
            }
        }
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        match self {
            Signer::Private(signer) => signer.verifying_key(),
            Signer::Kms(signer) => signer.verifying_key(),
        }
    }
}

#[async_trait]
impl anytrust::Sign for Signer {
    type Error = Error;

    async fn sign_digest(&self, digest: [u8; 32]) -> Result<[u8; 65], Self::Error> {
        match self {
            Signer::Private(signer) => Ok(signer.sign_digest(&digest)?),
            Signer::Kms(signer) => Ok(signer.sign_digest(&digest).await?),
        }
    }
}
