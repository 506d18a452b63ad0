//! Textual forms used to carry references over JSON transports.

use anyhow::{Context, bail};
use base64::{Engine, engine::general_purpose::STANDARD};

pub fn to_prefixed_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn from_prefixed_hex(value: &str) -> anyhow::Result<Vec<u8>> {
    let Some(stripped) = value.strip_prefix("0x") else {
        bail!("expected a 0x-prefixed hex string, got '{value}'");
    };

    hex::decode(stripped).with_context(|| format!("invalid hex string '{value}'"))
}

pub fn to_base64(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

pub fn from_base64(value: &str) -> anyhow::Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .with_context(|| format!("invalid base64 string '{value}'"))
}

/// Parses a 32 byte hash given either as `0x`-prefixed hex or as base64.
pub fn parse_hash(value: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = if value.starts_with("0x") {
        from_prefixed_hex(value)?
    } else {
        from_base64(value)?
    };

    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected a 32 byte hash, got {len} bytes"))
}
