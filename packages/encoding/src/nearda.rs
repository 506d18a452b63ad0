use anyhow::bail;

pub const MIN_FRAME_REF_LEN: usize = 32;

/// Reference to a frame posted through NEAR DA. The first 32 bytes identify
/// the submitting transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRef(Vec<u8>);

impl FrameRef {
    pub fn new(bytes: Vec<u8>) -> anyhow::Result<Self> {
        if bytes.len() < MIN_FRAME_REF_LEN {
            bail!(
                "frame reference must be at least {MIN_FRAME_REF_LEN} bytes, got {}",
                bytes.len()
            );
        }

        Ok(Self(bytes))
    }

    pub fn transaction_id(&self) -> [u8; 32] {
        let mut id = [0; 32];
        id.copy_from_slice(&self.0[..32]);
        id
    }

    /// Big endian `u32` read from the first four bytes.
    pub fn index(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}
