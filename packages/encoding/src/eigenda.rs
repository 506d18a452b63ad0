use crate::constants::BYTES_PER_FIELD_ELEMENT;

pub const BYTES_PER_SYMBOL: usize = BYTES_PER_FIELD_ELEMENT;
const PAYLOAD_BYTES_PER_SYMBOL: usize = BYTES_PER_SYMBOL - 1; // 31

/// Prefixes every 31 byte chunk with an empty byte so that each 32 byte symbol
/// stays below the bn254 field modulus. The final symbol is only as long as
/// its chunk requires.
pub fn convert_by_padding_empty_byte(data: &[u8]) -> Vec<u8> {
    let symbols = data.len().div_ceil(PAYLOAD_BYTES_PER_SYMBOL);
    let mut padded = Vec::with_capacity(symbols * BYTES_PER_SYMBOL);

    for chunk in data.chunks(PAYLOAD_BYTES_PER_SYMBOL) {
        padded.push(0x00);
        padded.extend_from_slice(chunk);
    }

    padded
}

/// Inverse of [`convert_by_padding_empty_byte`].
pub fn remove_empty_byte_from_padded_bytes(data: &[u8]) -> Vec<u8> {
    let symbols = data.len().div_ceil(BYTES_PER_SYMBOL);
    let mut unpadded = Vec::with_capacity(symbols * PAYLOAD_BYTES_PER_SYMBOL);

    for symbol in data.chunks(BYTES_PER_SYMBOL) {
        unpadded.extend_from_slice(&symbol[1..]);
    }

    unpadded
}
