/// Leading byte of marker calldata that points at a blob stored on Celestia.
pub const DERIVATION_VERSION_CELESTIA: u8 = 0xCE;

/// What a batch inbox transaction carries, judged by its calldata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerData<'a> {
    Empty,
    /// A Celestia blob id with the version byte already stripped.
    Celestia(&'a [u8]),
    /// The payload itself, posted as calldata when Celestia was unavailable.
    EthFallback(&'a [u8]),
}

pub fn encode_marker(blob_id: &[u8]) -> Vec<u8> {
    let mut calldata = Vec::with_capacity(blob_id.len() + 1);
    calldata.push(DERIVATION_VERSION_CELESTIA);
    calldata.extend_from_slice(blob_id);
    calldata
}

pub fn decode_marker(calldata: &[u8]) -> MarkerData<'_> {
    match calldata.split_first() {
        None => MarkerData::Empty,
        Some((&DERIVATION_VERSION_CELESTIA, id)) => MarkerData::Celestia(id),
        Some(_) => MarkerData::EthFallback(calldata),
    }
}
