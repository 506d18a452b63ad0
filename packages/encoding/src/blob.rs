use anyhow::bail;
use sha2::{Digest, Sha256};

use crate::constants::{BYTES_PER_BLOB, BYTES_PER_FIELD_ELEMENT, FIELD_ELEMENTS_PER_BLOB};

pub type Blob = Box<[u8; BYTES_PER_BLOB]>;

pub const ENCODING_VERSION: u8 = 0;
pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

const ROUNDS: usize = FIELD_ELEMENTS_PER_BLOB / 4;
/// Four field elements carry 4 * 31 full bytes plus 3 bytes spread over their
/// six spare bits each.
const BYTES_PER_ROUND: usize = 4 * (BYTES_PER_FIELD_ELEMENT - 1) + 3;
const ENCODED_BYTES_PER_ROUND: usize = 4 * BYTES_PER_FIELD_ELEMENT;
const HEADER_SIZE: usize = 4;

pub const MAX_BLOB_DATA_SIZE: usize = BYTES_PER_ROUND * ROUNDS - HEADER_SIZE;

/// Packs `data` into a single blob.
///
/// The logical stream is a version byte, a 3 byte big endian length and the
/// data itself, cut into rounds of 127 bytes. Every round fills four field
/// elements: 31 bytes go into the low bytes of each element and the remaining
/// three bytes are split into 6 bit pieces that occupy the leading byte of
/// each element, keeping the top two bits of every element zero.
pub fn encode(data: &[u8]) -> anyhow::Result<Blob> {
    if data.len() > MAX_BLOB_DATA_SIZE {
        bail!(
            "data is too large to fit into a blob: {} > {MAX_BLOB_DATA_SIZE}",
            data.len()
        );
    }

    let len = data.len() as u32;
    let mut stream = Vec::with_capacity(HEADER_SIZE + data.len());
    stream.push(ENCODING_VERSION);
    stream.extend_from_slice(&len.to_be_bytes()[1..]);
    stream.extend_from_slice(data);

    let mut blob: Blob = Box::new([0; BYTES_PER_BLOB]);
    for (chunk, out) in stream
        .chunks(BYTES_PER_ROUND)
        .zip(blob.chunks_exact_mut(ENCODED_BYTES_PER_ROUND))
    {
        let mut round = [0u8; BYTES_PER_ROUND];
        round[..chunk.len()].copy_from_slice(chunk);
        encode_round(&round, out);
    }

    Ok(blob)
}

/// Inverse of [`encode`]. Rejects blobs carrying an unknown version, invalid
/// field elements or any non-zero bytes past the encoded length.
pub fn decode(blob: &[u8; BYTES_PER_BLOB]) -> anyhow::Result<Vec<u8>> {
    let mut rounds = blob.chunks_exact(ENCODED_BYTES_PER_ROUND);
    let Some(first) = rounds.next() else {
        bail!("blob is empty");
    };

    let first = decode_round(first)?;
    let version = first[0];
    if version != ENCODING_VERSION {
        bail!("unsupported blob encoding version {version}, expected {ENCODING_VERSION}");
    }

    let len = u32::from_be_bytes([0, first[1], first[2], first[3]]) as usize;
    if len > MAX_BLOB_DATA_SIZE {
        bail!("blob declares {len} bytes, more than the maximum of {MAX_BLOB_DATA_SIZE}");
    }

    let stream_len = HEADER_SIZE + len;
    let rounds_used = stream_len.div_ceil(BYTES_PER_ROUND);

    let mut stream = Vec::with_capacity(rounds_used * BYTES_PER_ROUND);
    stream.extend_from_slice(&first);
    for encoded in rounds.by_ref().take(rounds_used - 1) {
        stream.extend_from_slice(&decode_round(encoded)?);
    }

    if let Some(pos) = stream[stream_len..].iter().position(|b| *b != 0) {
        bail!("extraneous data in blob at stream position {}", stream_len + pos);
    }

    let consumed = rounds_used * ENCODED_BYTES_PER_ROUND;
    if let Some(pos) = blob[consumed..].iter().position(|b| *b != 0) {
        bail!("extraneous data in blob at position {}", consumed + pos);
    }

    stream.truncate(stream_len);
    stream.drain(..HEADER_SIZE);

    Ok(stream)
}

fn encode_round(round: &[u8; BYTES_PER_ROUND], out: &mut [u8]) {
    let (x, y, z) = (round[31], round[63], round[95]);

    out[0] = x & 0b0011_1111;
    out[1..32].copy_from_slice(&round[0..31]);

    out[32] = (y & 0b0000_1111) | ((x & 0b1100_0000) >> 2);
    out[33..64].copy_from_slice(&round[32..63]);

    out[64] = z & 0b0011_1111;
    out[65..96].copy_from_slice(&round[64..95]);

    out[96] = ((z & 0b1100_0000) >> 2) | ((y & 0b1111_0000) >> 4);
    out[97..128].copy_from_slice(&round[96..127]);
}

fn decode_round(encoded: &[u8]) -> anyhow::Result<[u8; BYTES_PER_ROUND]> {
    for element in encoded.chunks_exact(BYTES_PER_FIELD_ELEMENT) {
        if element[0] & 0b1100_0000 != 0 {
            bail!("invalid field element, top two bits must be zero");
        }
    }

    let (a, b, c, d) = (encoded[0], encoded[32], encoded[64], encoded[96]);
    let x = (a & 0b0011_1111) | ((b & 0b0011_0000) << 2);
    let y = (b & 0b0000_1111) | ((d & 0b0000_1111) << 4);
    let z = (c & 0b0011_1111) | ((d & 0b0011_0000) << 2);

    let mut round = [0u8; BYTES_PER_ROUND];
    round[0..31].copy_from_slice(&encoded[1..32]);
    round[31] = x;
    round[32..63].copy_from_slice(&encoded[33..64]);
    round[63] = y;
    round[64..95].copy_from_slice(&encoded[65..96]);
    round[95] = z;
    round[96..127].copy_from_slice(&encoded[97..128]);

    Ok(round)
}

pub fn versioned_hash(commitment: &[u8; 48]) -> [u8; 32] {
    let mut hash: [u8; 32] = Sha256::digest(commitment).into();
    hash[0] = VERSIONED_HASH_VERSION_KZG;
    hash
}

pub fn generate_sidecar(
    blobs: impl IntoIterator<Item = Blob>,
) -> anyhow::Result<alloy::consensus::BlobTransactionSidecar> {
    let blobs = blobs
        .into_iter()
        .map(|blob| alloy::eips::eip4844::Blob::from(*blob))
        .collect::<Vec<_>>();
    let mut commitments = Vec::with_capacity(blobs.len());
    let mut proofs = Vec::with_capacity(blobs.len());
    let env_settings = alloy::consensus::EnvKzgSettings::default();
    let settings = env_settings.get();

    for blob in &blobs {
        // SAFETY: same size
        let blob =
            unsafe { core::mem::transmute::<&alloy::eips::eip4844::Blob, &c_kzg::Blob>(blob) };
        let commitment = settings.blob_to_kzg_commitment(blob)?;
        let proof = settings.compute_blob_kzg_proof(blob, &commitment.to_bytes())?;

        // SAFETY: same size
        unsafe {
            commitments.push(core::mem::transmute::<
                c_kzg::Bytes48,
                alloy::eips::eip4844::Bytes48,
            >(commitment.to_bytes()));
            proofs.push(core::mem::transmute::<
                c_kzg::Bytes48,
                alloy::eips::eip4844::Bytes48,
            >(proof.to_bytes()));
        }
    }

    Ok(alloy::consensus::BlobTransactionSidecar::new(
        blobs,
        commitments,
        proofs,
    ))
}

/// Checks a blob against its commitment and proof using the trusted setup.
pub fn verify(
    blob: &[u8; BYTES_PER_BLOB],
    commitment: &[u8; 48],
    proof: &[u8; 48],
) -> anyhow::Result<bool> {
    let env_settings = alloy::consensus::EnvKzgSettings::default();
    let settings = env_settings.get();

    let blob = c_kzg::Blob::from_bytes(blob.as_slice())?;
    let commitment = c_kzg::Bytes48::from_bytes(commitment.as_slice())?;
    let proof = c_kzg::Bytes48::from_bytes(proof.as_slice())?;

    Ok(settings.verify_blob_kzg_proof(&blob, &commitment, &proof)?)
}
