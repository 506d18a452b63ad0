use std::str::FromStr;

use alloy::{
    consensus::SignableTransaction,
    network::TxSigner,
    primitives::{Address, B256, ChainId},
    signers::{Signature, Signer as _},
};

use crate::{Error, KeySource, Result, load_config_from_env, read_key_file};

pub mod kms {
    pub use alloy::signers::aws::AwsSigner as Signer;
}
pub mod private_key {
    pub use alloy::signers::local::PrivateKeySigner as Signer;
}

/// Signs L1 transactions for one chain.
#[derive(Clone)]
pub enum Signer {
    Private(private_key::Signer),
    Kms(kms::Signer),
}

impl Signer {
    pub async fn from_key_source(source: &KeySource, chain_id: ChainId) -> Result<Self> {
        match source {
            KeySource::Private(key) => Self::private(key, chain_id),
            KeySource::File(path) => Self::private(&read_key_file(path)?, chain_id),
            KeySource::Kms(key_id) => {
                let config = load_config_from_env().await;
                let client = aws_sdk_kms::Client::new(&config);
                let signer = kms::Signer::new(client, key_id.clone(), Some(chain_id))
                    .await
                    .map_err(|e| Error::Kms(e.to_string()))?;

                Ok(Self::Kms(signer))
            }
        }
    }

    fn private(key: &str, chain_id: ChainId) -> Result<Self> {
        let signer = private_key::Signer::from_str(key)
            .map_err(|e| Error::InvalidPrivateKey(e.to_string()))?
            .with_chain_id(Some(chain_id));

        Ok(Self::Private(signer))
    }
}

#[async_trait::async_trait]
impl TxSigner<Signature> for Signer {
    fn address(&self) -> Address {
        match self {
            Signer::Private(local_signer) => local_signer.address(),
            Signer::Kms(aws_signer) => TxSigner::address(aws_signer),
        }
    }

    async fn sign_transaction(
        &self,
        tx: &mut dyn SignableTransaction<Signature>,
    ) -> alloy::signers::Result<Signature> {
        match self {
            Signer::Private(local_signer) => local_signer.sign_transaction(tx).await,
            Signer::Kms(aws_signer) => aws_signer.sign_transaction(tx).await,
        }
    }
}

#[async_trait::async_trait]
impl alloy::signers::Signer<Signature> for Signer {
    async fn sign_hash(&self, hash: &B256) -> alloy::signers::Result<Signature> {
        match self {
            Signer::Private(local_signer) => local_signer.sign_hash(hash).await,
            Signer::Kms(aws_signer) => aws_signer.sign_hash(hash).await,
        }
    }

    fn address(&self) -> Address {
        match self {
            Signer::Private(local_signer) => local_signer.address(),
            Signer::Kms(aws_signer) => alloy::signers::Signer::<Signature>::address(aws_signer),
        }
    }

    fn chain_id(&self) -> Option<ChainId> {
        match self {
            Signer::Private(local_signer) => local_signer.chain_id(),
            Signer::Kms(aws_signer) => aws_signer.chain_id(),
        }
    }

    fn set_chain_id(&mut self, chain_id: Option<ChainId>) {
        match self {
            Signer::Private(local_signer) => local_signer.set_chain_id(chain_id),
            Signer::Kms(aws_signer) => aws_signer.set_chain_id(chain_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use alloy::primitives::address;
    use pretty_assertions::assert_eq;

    use super::*;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn private_key_signer_is_bound_to_the_chain() {
        // given
        let source = KeySource::Private(DEV_KEY.to_string());

        // when
        let signer = Signer::from_key_source(&source, 17_000).await.unwrap();

        // then
        assert_eq!(
            TxSigner::address(&signer),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert_eq!(alloy::signers::Signer::chain_id(&signer), Some(17_000));
    }

    #[tokio::test]
    async fn key_file_yields_the_same_signer() {
        // given
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{DEV_KEY}").unwrap();
        let source = KeySource::File(file.path().to_path_buf());

        // when
        let signer = Signer::from_key_source(&source, 1).await.unwrap();

        // then
        assert_eq!(
            TxSigner::address(&signer),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
    }

    #[tokio::test]
    async fn missing_key_file_is_reported() {
        let source = KeySource::File("/nonexistent/eth.key".into());

        let result = Signer::from_key_source(&source, 1).await;

        assert!(matches!(result, Err(Error::KeyFile(path, _)) if path == "/nonexistent/eth.key"));
    }

    #[tokio::test]
    async fn malformed_private_key_is_rejected() {
        let source = KeySource::Private("0x1234".to_string());

        let result = Signer::from_key_source(&source, 1).await;

        assert!(matches!(result, Err(Error::InvalidPrivateKey(_))));
    }
}
