use alloy::primitives::Address;

use crate::{
    Result,
    types::{BlockHeader, L1Transaction, TxRequest},
};

#[allow(async_fn_in_trait)]
#[trait_variant::make(Send)]
#[cfg_attr(feature = "test-helpers", mockall::automock)]
pub trait Api {
    /// Address of the signer transactions are sent from.
    fn sender(&self) -> Address;
    async fn suggested_priority_fee(&self) -> Result<u128>;
    async fn blob_base_fee(&self) -> Result<u128>;
    async fn latest_header(&self) -> Result<BlockHeader>;
    async fn header_by_number(&self, number: u64) -> Result<Option<BlockHeader>>;
    /// Signs and sends the transaction with the sender's next nonce,
    /// returning its hash. Concurrent sends get distinct nonces.
    async fn send_transaction(&self, tx: TxRequest) -> Result<[u8; 32]>;
    async fn transaction(&self, hash: [u8; 32]) -> Result<Option<L1Transaction>>;
    /// Number of the block the transaction was included in, if it was.
    async fn inclusion_block(&self, hash: [u8; 32]) -> Result<Option<u64>>;
}
