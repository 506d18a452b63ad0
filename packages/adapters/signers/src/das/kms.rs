use aws_sdk_kms::{Client as AwsKmsClient, primitives::Blob};
use k256::{
    ecdsa::{RecoveryId, Signature, VerifyingKey},
    pkcs8::DecodePublicKey,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("KMS GetPublicKey operation failed")]
    KmsGetPublicKey(#[from] aws_sdk_kms::operation::get_public_key::GetPublicKeyError),

    #[error("KMS Sign operation failed")]
    KmsSign(#[from] aws_sdk_kms::operation::sign::SignError),

    #[error("Failed to get public key from KMS")]
    MissingPublicKey,

    #[error("Failed to get signature from KMS")]
    MissingSignature,

    #[error("Failed to parse DER-encoded public key")]
    InvalidPublicKeyDer(#[source] k256::pkcs8::spki::Error),

    #[error("Failed to parse DER-encoded signature")]
    InvalidSignatureDer(#[source] k256::ecdsa::Error),

    #[error("Could not determine recovery ID for signature")]
    RecoveryIdNotFound,
}

type Result<T> = std::result::Result<T, Error>;

/// secp256k1 key held in AWS KMS.
#[derive(Debug, Clone)]
pub struct Signer {
    key_id: String,
    client: AwsKmsClient,
    verifying_key: VerifyingKey,
}

impl Signer {
    pub async fn new(client: AwsKmsClient, key_id: String) -> Result<Self> {
        let response = client
            .get_public_key()
            .key_id(&key_id)
            .send()
            .await
            .map_err(|e| e.into_service_error())?;

        let public_key_der = response
            .public_key
            .ok_or(Error::MissingPublicKey)?
            .into_inner();

        let verifying_key = VerifyingKey::from_public_key_der(&public_key_der)
            .map_err(Error::InvalidPublicKeyDer)?;

        Ok(Self {
            key_id,
            client,
            verifying_key,
        })
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// `r || s || v` with `v` in `{0, 1}`.
    pub async fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; 65]> {
        let signature = self.sign_with_kms(digest).await?;
        let recovery_id = self.compute_recovery_id(digest, &signature)?;

        let mut sig_bytes = [0u8; 65];
        sig_bytes[..64].copy_from_slice(&signature.to_bytes());
        sig_bytes[64] = recovery_id.to_byte();

        Ok(sig_bytes)
    }

    async fn sign_with_kms(&self, digest: &[u8]) -> Result<Signature> {
        let response = self
            .client
            .sign()
            .key_id(&self.key_id)
            .message(Blob::new(digest))
            .message_type(aws_sdk_kms::types::MessageType::Digest)
            .signing_algorithm(aws_sdk_kms::types::SigningAlgorithmSpec::EcdsaSha256)
            .send()
            .await
            .map_err(|e| e.into_service_error())?;

        let signature_der = response.signature.ok_or(Error::MissingSignature)?;

        let signature =
            Signature::from_der(signature_der.as_ref()).map_err(Error::InvalidSignatureDer)?;

        // KMS does not normalize s
        Ok(signature.normalize_s().unwrap_or(signature))
    }

    fn compute_recovery_id(&self, digest: &[u8; 32], signature: &Signature) -> Result<RecoveryId> {
        recovery_id_for(&self.verifying_key, digest, signature)
    }
}

/// Only ids 0 and 1 occur for keys on secp256k1.
fn recovery_id_for(
    key: &VerifyingKey,
    digest: &[u8; 32],
    signature: &Signature,
) -> Result<RecoveryId> {
    (0..2)
        .filter_map(RecoveryId::from_byte)
        .find(|rec_id| {
            VerifyingKey::recover_from_prehash(digest, signature, *rec_id)
                .is_ok_and(|recovered| recovered == *key)
        })
        .ok_or(Error::RecoveryIdNotFound)
}

#[cfg(test)]
mod tests {
    use k256::ecdsa::SigningKey;

    use super::*;

    #[test]
    fn recovery_id_is_found_for_a_normalized_signature() {
        // given
        let key = SigningKey::from_slice(&[7; 32]).unwrap();
        let digest = [9; 32];
        let (signature, expected) = key.sign_prehash_recoverable(&digest).unwrap();

        // when
        let found = recovery_id_for(key.verifying_key(), &digest, &signature).unwrap();

        // then
        assert_eq!(found, expected);
    }

    #[test]
    fn foreign_signature_has_no_recovery_id() {
        let key = SigningKey::from_slice(&[7; 32]).unwrap();
        let other = SigningKey::from_slice(&[8; 32]).unwrap();
        let digest = [9; 32];
        let (signature, _) = other.sign_prehash_recoverable(&digest).unwrap();

        let result = recovery_id_for(key.verifying_key(), &digest, &signature);

        assert!(matches!(result, Err(Error::RecoveryIdNotFound)));
    }
}
