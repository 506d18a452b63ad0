use k256::ecdsa::{SigningKey, VerifyingKey};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("private key is not valid hex")]
    InvalidHex(#[source] hex::FromHexError),
    #[error("not a secp256k1 private key")]
    InvalidKey(#[source] k256::ecdsa::Error),
    #[error("failed to sign digest")]
    Signing(#[source] k256::ecdsa::Error),
}

#[derive(Debug, Clone)]
pub struct Signer {
    key: SigningKey,
}

impl Signer {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Accepts the key with or without a `0x` prefix.
    pub fn from_hex(key: &str) -> Result<Self, Error> {
        let bytes = hex::decode(key.trim_start_matches("0x")).map_err(Error::InvalidHex)?;
        let key = SigningKey::from_slice(&bytes).map_err(Error::InvalidKey)?;

        Ok(Self::new(key))
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.key.verifying_key()
    }

    /// `r || s || v` with `v` in `{0, 1}`.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; 65], Error> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest)
            .map_err(Error::Signing)?;

        let mut sig_bytes = [0u8; 65];
        sig_bytes[..64].copy_from_slice(&signature.to_bytes());
        sig_bytes[64] = recovery_id.to_byte();

        Ok(sig_bytes)
    }
}

#[cfg(test)]
mod tests {
    use k256::ecdsa::{RecoveryId, Signature};
    use pretty_assertions::assert_eq;

    use super::*;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn signature_recovers_to_the_signing_key() {
        // given
        let signer = Signer::from_hex(KEY).unwrap();
        let digest = [0x42; 32];

        // when
        let sig = signer.sign_digest(&digest).unwrap();

        // then
        let signature = Signature::from_slice(&sig[..64]).unwrap();
        let recovery_id = RecoveryId::from_byte(sig[64]).unwrap();
        let recovered = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id).unwrap();
        assert_eq!(&recovered, signer.verifying_key());
    }

    #[test]
    fn prefix_is_optional() {
        let with = Signer::from_hex(KEY).unwrap();
        let without = Signer::from_hex(KEY.trim_start_matches("0x")).unwrap();

        assert_eq!(with.verifying_key(), without.verifying_key());
    }

    #[test]
    fn zero_key_is_rejected() {
        let err = Signer::from_hex(&"00".repeat(32)).unwrap_err();

        assert!(matches!(err, Error::InvalidKey(_)));
    }
}
