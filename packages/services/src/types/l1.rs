use alloy::{consensus::BlobTransactionSidecar, primitives::Address};
use da_gateway_encoding::blob::Blob;

/// Which L1 addresses mark a transaction as a genuine batch transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSourceConfig {
    pub batch_inbox_address: Address,
    pub batcher_address: Address,
}

impl DataSourceConfig {
    /// Both the destination and the recovered signer have to match. Anyone can
    /// send a transaction to the inbox.
    pub fn is_batch_tx(&self, tx: &L1Transaction) -> bool {
        tx.to == Some(self.batch_inbox_address) && tx.from == self.batcher_address
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L1Transaction {
    pub hash: [u8; 32],
    /// Signer recovered from the transaction signature.
    pub from: Address,
    pub to: Option<Address>,
    pub input: Vec<u8>,
    pub blob_versioned_hashes: Vec<[u8; 32]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: [u8; 32],
    pub parent_hash: [u8; 32],
    pub timestamp: u64,
    pub base_fee_per_gas: Option<u64>,
}

/// A transaction to be crafted for the batch inbox, carrying the payload
/// either as calldata or as blobs.
#[derive(Debug, Clone)]
pub struct BlobTxCandidate {
    pub to: Address,
    pub calldata: Vec<u8>,
    pub blobs: Vec<Blob>,
    pub gas_limit: u64,
}

impl BlobTxCandidate {
    pub fn calldata(to: Address, calldata: Vec<u8>) -> Self {
        Self {
            to,
            calldata,
            blobs: vec![],
            gas_limit: 0,
        }
    }

    pub fn blobs(to: Address, blobs: Vec<Blob>) -> Self {
        Self {
            to,
            calldata: vec![],
            blobs,
            gas_limit: 0,
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_blob_gas: Option<u128>,
}

/// Transaction ready to be signed and sent. The nonce is assigned by the
/// sender.
#[derive(Debug, Clone, PartialEq)]
pub struct TxRequest {
    pub to: Address,
    pub input: Vec<u8>,
    pub sidecar: Option<BlobTransactionSidecar>,
    pub gas_limit: u64,
    pub fees: Fees,
}
