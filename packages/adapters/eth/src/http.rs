use std::{sync::Arc, time::Duration};

use alloy::{
    consensus::Transaction as _,
    eips::BlockNumberOrTag,
    network::{EthereumWallet, TransactionBuilder, TransactionBuilder4844, TxSigner},
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder, SendableTx},
    rpc::types::{Header, TransactionRequest},
    signers::Signature,
};
use metrics::{
    RegistersMetrics,
    prometheus::{self, histogram_opts},
};
use services::types::{BlockHeader, L1Transaction, TxRequest};
use tokio::sync::Mutex;
use tracing::info;
use url::Url;

use crate::error::{Error, Result};

/// L1 execution client sending through a single wallet over HTTP. Clones
/// share one nonce sequence.
#[derive(Clone)]
pub struct HttpClient {
    provider: DynProvider,
    sender: Address,
    chain_id: u64,
    send_tx_request_timeout: Duration,
    send_lock: Arc<Mutex<()>>,
    metrics: Metrics,
}

impl HttpClient {
    /// Fails if the node is on a different chain than `chain_id`.
    pub async fn connect<S>(
        url: Url,
        signer: S,
        chain_id: u64,
        send_tx_request_timeout: Duration,
    ) -> Result<Self>
    where
        S: TxSigner<Signature> + Send + Sync + 'static,
    {
        let sender = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        let reported = provider.get_chain_id().await?;
        if reported != chain_id {
            return Err(Error::Other(format!(
                "node reports chain id {reported}, expected {chain_id}"
            )));
        }

        info!("connected to l1 chain {chain_id} as {sender}");

        Ok(Self::from_provider(
            provider,
            sender,
            chain_id,
            send_tx_request_timeout,
        ))
    }

    pub fn from_provider(
        provider: DynProvider,
        sender: Address,
        chain_id: u64,
        send_tx_request_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            sender,
            chain_id,
            send_tx_request_timeout,
            send_lock: Arc::default(),
            metrics: Metrics::default(),
        }
    }

    async fn pending_nonce(&self) -> Result<u64> {
        Ok(self
            .provider
            .get_transaction_count(self.sender)
            .pending()
            .await?)
    }

    fn transaction_request(&self, tx: TxRequest, nonce: u64) -> TransactionRequest {
        let mut request = TransactionRequest::default()
            .with_to(tx.to)
            .with_input(tx.input)
            .with_gas_limit(tx.gas_limit)
            .with_nonce(nonce)
            .with_chain_id(self.chain_id)
            .with_max_fee_per_gas(tx.fees.max_fee_per_gas)
            .with_max_priority_fee_per_gas(tx.fees.max_priority_fee_per_gas);

        if let Some(sidecar) = tx.sidecar {
            request = request.with_blob_sidecar(sidecar);
        }
        if let Some(max_fee_per_blob_gas) = tx.fees.max_fee_per_blob_gas {
            request = request.with_max_fee_per_blob_gas(max_fee_per_blob_gas);
        }

        request
    }

    async fn header(&self, tag: BlockNumberOrTag) -> Result<Option<BlockHeader>> {
        let block = self.provider.get_block_by_number(tag).await?;

        Ok(block.map(|block| convert_header(&block.header)))
    }
}

fn convert_header(header: &Header) -> BlockHeader {
    BlockHeader {
        number: header.number,
        hash: header.hash.0,
        parent_hash: header.parent_hash.0,
        timestamp: header.timestamp,
        base_fee_per_gas: header.base_fee_per_gas,
    }
}

impl RegistersMetrics for HttpClient {
    fn metrics(&self) -> Vec<Box<dyn metrics::prometheus::core::Collector>> {
        vec![Box::new(self.metrics.blobs_per_tx.clone())]
    }
}

#[derive(Clone)]
struct Metrics {
    blobs_per_tx: prometheus::Histogram,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            blobs_per_tx: prometheus::Histogram::with_opts(histogram_opts!(
                "eth_blobs_per_tx",
                "Number of blobs per blob transaction",
                vec![1.0f64, 2., 3., 4., 5., 6.]
            ))
            .expect("to be correctly configured"),
        }
    }
}

impl services::ports::l1::Api for HttpClient {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn suggested_priority_fee(&self) -> services::Result<u128> {
        Ok(self
            .provider
            .get_max_priority_fee_per_gas()
            .await
            .map_err(Error::from)?)
    }

    async fn blob_base_fee(&self) -> services::Result<u128> {
        Ok(self
            .provider
            .get_blob_base_fee()
            .await
            .map_err(Error::from)?)
    }

    async fn latest_header(&self) -> services::Result<BlockHeader> {
        self.header(BlockNumberOrTag::Latest).await?.ok_or_else(|| {
            services::Error::Network("node returned no latest block".to_string())
        })
    }

    async fn header_by_number(&self, number: u64) -> services::Result<Option<BlockHeader>> {
        Ok(self.header(BlockNumberOrTag::Number(number)).await?)
    }

    async fn send_transaction(&self, tx: TxRequest) -> services::Result<[u8; 32]> {
        let num_blobs = tx.sidecar.as_ref().map_or(0, |sidecar| sidecar.blobs.len());

        // held until the node has accepted the transaction, so the next
        // pending nonce already accounts for it
        let _sending = self.send_lock.lock().await;
        let nonce = self.pending_nonce().await?;
        let request = self.transaction_request(tx, nonce);

        let filled = self.provider.fill(request).await.map_err(Error::from)?;
        let SendableTx::Envelope(envelope) = filled else {
            return Err(Error::Other(
                "Expected an envelope because we have a wallet filler as well, but got a builder from alloy. This is a bug.".to_string(),
            )
            .into());
        };
        let tx_hash = *envelope.tx_hash();

        let send_fut = self.provider.send_tx_envelope(envelope);
        tokio::time::timeout(self.send_tx_request_timeout, send_fut)
            .await
            .map_err(|_| Error::Network {
                msg: "timed out trying to send the transaction".to_string(),
                recoverable: true,
            })?
            .map_err(Error::from)?;

        if num_blobs > 0 {
            self.metrics.blobs_per_tx.observe(num_blobs as f64);
        }
        info!("sent tx {tx_hash} with nonce {nonce} carrying {num_blobs} blobs");

        Ok(tx_hash.0)
    }

    async fn transaction(&self, hash: [u8; 32]) -> services::Result<Option<L1Transaction>> {
        let Some(tx) = self
            .provider
            .get_transaction_by_hash(hash.into())
            .await
            .map_err(Error::from)?
        else {
            return Ok(None);
        };

        let blob_versioned_hashes = tx
            .blob_versioned_hashes()
            .map(|hashes| hashes.iter().map(|hash| hash.0).collect())
            .unwrap_or_default();

        Ok(Some(L1Transaction {
            hash,
            from: tx.inner.signer(),
            to: tx.to(),
            input: tx.input().to_vec(),
            blob_versioned_hashes,
        }))
    }

    async fn inclusion_block(&self, hash: [u8; 32]) -> services::Result<Option<u64>> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash.into())
            .await
            .map_err(Error::from)?;

        Ok(receipt.and_then(|receipt| receipt.block_number))
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        consensus,
        primitives::{B256, U64},
        transports::mock::Asserter,
    };
    use pretty_assertions::assert_eq;
    use services::ports::l1::Api;

    use super::*;

    fn client(asserter: Asserter) -> HttpClient {
        let provider = ProviderBuilder::new()
            .connect_mocked_client(asserter)
            .erased();

        HttpClient::from_provider(
            provider,
            Address::repeat_byte(0xba),
            1,
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn nonce_is_taken_from_the_node() {
        // given
        let asserter = Asserter::new();
        asserter.push_success(&U64::from(7));
        let client = client(asserter);

        // when
        let nonce = client.pending_nonce().await.unwrap();

        // then
        assert_eq!(nonce, 7);
    }

    #[tokio::test]
    async fn unknown_transaction_is_none() {
        let asserter = Asserter::new();
        asserter.push_success(&Option::<()>::None);

        let tx = client(asserter).transaction([1; 32]).await.unwrap();

        assert!(tx.is_none());
    }

    #[tokio::test]
    async fn pending_transaction_has_no_inclusion_block() {
        let asserter = Asserter::new();
        asserter.push_success(&Option::<()>::None);

        let block = client(asserter).inclusion_block([1; 32]).await.unwrap();

        assert_eq!(block, None);
    }

    #[tokio::test]
    async fn node_error_responses_are_not_network_faults() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("internal error");

        let err = client(asserter).blob_base_fee().await.unwrap_err();

        assert!(matches!(err, services::Error::Other(_)));
    }

    #[test]
    fn header_fields_are_carried_over() {
        // given
        let header = Header {
            hash: B256::repeat_byte(2),
            inner: consensus::Header {
                number: 42,
                parent_hash: B256::repeat_byte(1),
                timestamp: 1_700_000_000,
                base_fee_per_gas: Some(7),
                ..Default::default()
            },
            total_difficulty: None,
            size: None,
        };

        // when
        let converted = convert_header(&header);

        // then
        assert_eq!(
            converted,
            BlockHeader {
                number: 42,
                hash: [2; 32],
                parent_hash: [1; 32],
                timestamp: 1_700_000_000,
                base_fee_per_gas: Some(7),
            }
        );
    }

    #[test]
    fn request_carries_the_configured_chain_id_and_fees() {
        // given
        let client = client(Asserter::new());
        let tx = TxRequest {
            to: Address::repeat_byte(0xff),
            input: vec![1, 2, 3],
            sidecar: None,
            gas_limit: 21_064,
            fees: services::types::Fees {
                max_fee_per_gas: 210,
                max_priority_fee_per_gas: 10,
                max_fee_per_blob_gas: None,
            },
        };

        // when
        let request = client.transaction_request(tx, 3);

        // then
        assert_eq!(request.chain_id, Some(1));
        assert_eq!(request.nonce, Some(3));
        assert_eq!(request.gas, Some(21_064));
        assert_eq!(request.max_fee_per_gas, Some(210));
        assert_eq!(request.max_priority_fee_per_gas, Some(10));
        assert_eq!(request.max_fee_per_blob_gas, None);
        assert!(request.sidecar.is_none());
    }
}
