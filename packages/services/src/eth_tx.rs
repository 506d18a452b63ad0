//! Crafting of batch inbox transactions shared by the EIP-4844 and Celestia
//! backends.

use da_gateway_encoding::{blob, reference};
use tracing::{debug, warn};

use crate::{
    Error, InvalidInputContext, Result,
    ports::l1,
    types::{BlobTxCandidate, DaReference, DataSourceConfig, Fees, L1Transaction, TxRequest},
};

const TX_GAS: u64 = 21_000;
const TX_DATA_ZERO_GAS: u64 = 4;
const TX_DATA_NON_ZERO_GAS: u64 = 16;
const TOTAL_COST_FLOOR_PER_TOKEN: u64 = 10;

/// Gas needed to carry `data` as calldata, including the EIP-7623 floor.
pub fn intrinsic_gas(data: &[u8]) -> u64 {
    let zeros = data.iter().filter(|b| **b == 0).count() as u64;
    let non_zeros = data.len() as u64 - zeros;

    let standard = TX_GAS + zeros * TX_DATA_ZERO_GAS + non_zeros * TX_DATA_NON_ZERO_GAS;
    let tokens = zeros + non_zeros * 4;
    let floor = TX_GAS + tokens * TOTAL_COST_FLOOR_PER_TOKEN;

    standard.max(floor)
}

/// Leaves room for one base fee increase before inclusion.
pub fn fee_cap(base_fee: u128, tip: u128) -> u128 {
    tip.saturating_add(base_fee.saturating_mul(2))
}

/// Fetches fees, attaches KZG commitments for any blobs and sends
/// the resulting transaction through `l1`.
pub async fn send_candidate<L1>(l1: &L1, candidate: BlobTxCandidate) -> Result<[u8; 32]>
where
    L1: l1::Api + Sync,
{
    debug!(
        "crafting transaction with {} blobs and {} bytes of calldata",
        candidate.blobs.len(),
        candidate.calldata.len()
    );

    let sidecar = if candidate.blobs.is_empty() {
        None
    } else {
        let sidecar = blob::generate_sidecar(candidate.blobs)
            .map_err(|e| Error::Other(format!("failed to make sidecar: {e}")))?;
        Some(sidecar)
    };

    let tip = l1.suggested_priority_fee().await?;
    let header = l1.latest_header().await?;
    let base_fee = header
        .base_fee_per_gas
        .ok_or_else(|| Error::Other("latest block header has no base fee".to_string()))?;

    let max_fee_per_blob_gas = match sidecar {
        Some(_) => Some(l1.blob_base_fee().await?.saturating_mul(2)),
        None => None,
    };

    let tx = TxRequest {
        to: candidate.to,
        input: candidate.calldata,
        sidecar,
        gas_limit: candidate.gas_limit,
        fees: Fees {
            max_fee_per_gas: fee_cap(base_fee.into(), tip),
            max_priority_fee_per_gas: tip,
            max_fee_per_blob_gas,
        },
    };

    l1.send_transaction(tx).await
}

pub fn parse_tx_hash(reference: &DaReference) -> Result<[u8; 32]> {
    let bytes =
        reference::from_prefixed_hex(reference.as_str()).invalid_input("malformed transaction hash")?;
    let len = bytes.len();

    bytes
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("transaction hash must be 32 bytes, got {len}")))
}

/// Looks up the transaction behind `reference` and makes sure it was sent to
/// the batch inbox by the batcher.
pub async fn fetch_batch_tx<L1>(
    l1: &L1,
    data_source: &DataSourceConfig,
    reference: &DaReference,
) -> Result<L1Transaction>
where
    L1: l1::Api + Sync,
{
    let hash = parse_tx_hash(reference)?;
    let tx = l1
        .transaction(hash)
        .await?
        .ok_or_else(|| Error::InvalidInput(format!("transaction {reference} not found")))?;

    if !data_source.is_batch_tx(&tx) {
        warn!(
            "transaction {reference} from {} to {:?} is not a batch transaction",
            tx.from, tx.to
        );
        return Err(Error::InvalidInput(format!(
            "transaction {reference} is not a batch transaction"
        )));
    }

    Ok(tx)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;

    use super::*;
    use crate::types::BlockHeader;

    #[test]
    fn tx_hash_needs_prefix_and_length() {
        let hash = reference::to_prefixed_hex([7; 32]);

        assert_eq!(parse_tx_hash(&hash.as_str().into()).unwrap(), [7; 32]);
        assert!(parse_tx_hash(&hex::encode([7; 32]).into()).is_err());
        assert!(parse_tx_hash(&"0x0707".into()).is_err());
    }

    #[tokio::test]
    async fn foreign_sender_is_not_a_batch_tx() {
        // given
        let inbox = Address::repeat_byte(1);
        let data_source = DataSourceConfig {
            batch_inbox_address: inbox,
            batcher_address: Address::repeat_byte(2),
        };
        let mut l1 = l1::MockApi::new();
        l1.expect_transaction().returning(move |hash| {
            Box::pin(async move {
                Ok(Some(L1Transaction {
                    hash,
                    from: Address::repeat_byte(3),
                    to: Some(inbox),
                    input: vec![1],
                    blob_versioned_hashes: vec![],
                }))
            })
        });

        // when
        let tx_ref: DaReference = reference::to_prefixed_hex([5; 32]).into();
        let err = fetch_batch_tx(&l1, &data_source, &tx_ref)
            .await
            .unwrap_err();

        // then
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("not a batch transaction")));
    }

    #[test]
    fn fee_cap_doubles_the_base_fee() {
        assert_eq!(fee_cap(100, 10), 210);
    }

    #[test]
    fn intrinsic_gas_prices_zero_and_non_zero_bytes() {
        assert_eq!(intrinsic_gas(&[]), 21_000);
        // standard 21_020, floor 21_000 + 5 * 10
        assert_eq!(intrinsic_gas(&[1, 0]), 21_050);
    }

    #[test]
    fn intrinsic_gas_respects_the_calldata_floor() {
        // 100 non zero bytes: standard 22_600, floor 21_000 + 400 * 10
        assert_eq!(intrinsic_gas(&[1; 100]), 25_000);
    }

    fn header(base_fee: u64) -> BlockHeader {
        BlockHeader {
            number: 10,
            hash: [1; 32],
            parent_hash: [0; 32],
            timestamp: 0,
            base_fee_per_gas: Some(base_fee),
        }
    }

    #[tokio::test]
    async fn calldata_candidate_uses_fee_cap_and_no_blob_fee() {
        // given
        let mut l1 = l1::MockApi::new();
        l1.expect_suggested_priority_fee()
            .returning(|| Box::pin(async { Ok(10) }));
        l1.expect_latest_header()
            .returning(|| Box::pin(async { Ok(header(100)) }));
        l1.expect_blob_base_fee().never();
        l1.expect_send_transaction().once().returning(|tx| {
            assert_eq!(tx.gas_limit, 21_500);
            assert_eq!(tx.input, b"data");
            assert!(tx.sidecar.is_none());
            assert_eq!(
                tx.fees,
                Fees {
                    max_fee_per_gas: 210,
                    max_priority_fee_per_gas: 10,
                    max_fee_per_blob_gas: None,
                }
            );
            Box::pin(async { Ok([9; 32]) })
        });

        let candidate = BlobTxCandidate::calldata(Address::repeat_byte(1), b"data".to_vec())
            .with_gas_limit(21_500);

        // when
        let hash = send_candidate(&l1, candidate).await.unwrap();

        // then
        assert_eq!(hash, [9; 32]);
    }

    #[tokio::test]
    async fn header_without_base_fee_is_an_error() {
        let mut l1 = l1::MockApi::new();
        l1.expect_suggested_priority_fee()
            .returning(|| Box::pin(async { Ok(1) }));
        l1.expect_latest_header().returning(|| {
            Box::pin(async {
                Ok(BlockHeader {
                    base_fee_per_gas: None,
                    ..header(0)
                })
            })
        });
        l1.expect_send_transaction().never();

        let candidate = BlobTxCandidate::calldata(Address::ZERO, vec![1]);

        let err = send_candidate(&l1, candidate).await.unwrap_err();

        assert!(err.to_string().contains("no base fee"));
    }
}
