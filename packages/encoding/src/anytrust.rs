use anyhow::{Context, bail};
use sha3::{Digest, Keccak256};

pub const BLS_SIGNATURE_LEN: usize = 96;

const CERTIFICATE_FLAG: u8 = 0x80;
const VERSIONED_FLAG: u8 = 0x08;

const STORE_SIGNING_PREFIX: &[u8] = b"Arbitrum Nitro DAS API Store:";

/// Data availability certificate returned by a DAS committee after a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub keyset_hash: [u8; 32],
    pub data_hash: [u8; 32],
    pub timeout: u64,
    pub signers_mask: u64,
    pub signature: [u8; BLS_SIGNATURE_LEN],
    pub version: u8,
}

impl Certificate {
    pub fn serialize(&self) -> Vec<u8> {
        let mut flags = CERTIFICATE_FLAG;
        if self.version != 0 {
            flags |= VERSIONED_FLAG;
        }

        let mut buf = Vec::with_capacity(1 + 32 + 32 + 8 + 1 + 8 + BLS_SIGNATURE_LEN);
        buf.push(flags);
        buf.extend_from_slice(&self.keyset_hash);
        buf.extend_from_slice(&self.data_hash);
        buf.extend_from_slice(&self.timeout.to_be_bytes());
        if self.version != 0 {
            buf.push(self.version);
        }
        buf.extend_from_slice(&self.signers_mask.to_be_bytes());
        buf.extend_from_slice(&self.signature);

        buf
    }

    pub fn deserialize(bytes: &[u8]) -> anyhow::Result<Self> {
        let mut reader = Reader(bytes);

        let [flags] = reader.take::<1>()?;
        if flags & CERTIFICATE_FLAG == 0 {
            bail!("not a data availability certificate, flags {flags:#04x}");
        }

        let keyset_hash = reader.take::<32>()?;
        let data_hash = reader.take::<32>()?;
        let timeout = u64::from_be_bytes(reader.take::<8>()?);
        let version = if flags & VERSIONED_FLAG != 0 {
            let [version] = reader.take::<1>()?;
            version
        } else {
            0
        };
        let signers_mask = u64::from_be_bytes(reader.take::<8>()?);
        let signature = reader.take::<BLS_SIGNATURE_LEN>()?;

        if !reader.0.is_empty() {
            bail!(
                "{} unexpected trailing bytes after certificate",
                reader.0.len()
            );
        }

        Ok(Self {
            keyset_hash,
            data_hash,
            timeout,
            signers_mask,
            signature,
            version,
        })
    }
}

struct Reader<'a>(&'a [u8]);

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> anyhow::Result<[u8; N]> {
        if self.0.len() < N {
            bail!(
                "certificate truncated, needed {N} more bytes but only {} remain",
                self.0.len()
            );
        }
        let (head, rest) = self.0.split_at(N);
        self.0 = rest;

        head.try_into().context("slice has the requested length")
    }
}

/// Hash a DAS store request is signed over.
pub fn store_signing_hash(message: &[u8], timeout: u64) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(STORE_SIGNING_PREFIX);
    hasher.update(timeout.to_be_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn certificate(version: u8) -> Certificate {
        Certificate {
            keyset_hash: [1; 32],
            data_hash: [2; 32],
            timeout: 0x0102_0304_0506_0708,
            signers_mask: 0b101,
            signature: [3; BLS_SIGNATURE_LEN],
            version,
        }
    }

    #[test]
    fn unversioned_layout() {
        // when
        let bytes = certificate(0).serialize();

        // then
        assert_eq!(bytes.len(), 1 + 32 + 32 + 8 + 8 + 96);
        assert_eq!(bytes[0], 0x80);
        assert_eq!(&bytes[65..73], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&bytes[73..81], &5u64.to_be_bytes());
    }

    #[test]
    fn versioned_certificate_carries_version_byte_after_timeout() {
        // when
        let bytes = certificate(1).serialize();

        // then
        assert_eq!(bytes[0], 0x88);
        assert_eq!(bytes[73], 1);
        assert_eq!(Certificate::deserialize(&bytes).unwrap(), certificate(1));
    }

    #[test]
    fn deserializes_unversioned_certificate() {
        let bytes = certificate(0).serialize();

        assert_eq!(Certificate::deserialize(&bytes).unwrap(), certificate(0));
    }

    #[test]
    fn truncated_certificate_is_rejected() {
        let bytes = certificate(0).serialize();

        let err = Certificate::deserialize(&bytes[..100]).unwrap_err();

        assert!(err.to_string().contains("certificate truncated"));
    }

    #[test]
    fn signing_hash_depends_on_timeout() {
        let message = b"batch";

        assert_ne!(
            store_signing_hash(message, 1),
            store_signing_hash(message, 2)
        );
    }
}
