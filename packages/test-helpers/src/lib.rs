#![deny(unused_crate_dependencies)]

pub mod http;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clock::TestClock;
use rand::RngCore;
use services::{
    Adapters, ConfirmationPoller, DispatchRouter,
    anytrust::AnyTrustService,
    celestia::CelestiaService,
    eigenda::EigenDaService,
    eip4844::{Carrier, Eip4844Service},
    nearda::NearDaService,
    types::{Address, DataSourceConfig},
};

pub fn random_data(size: usize) -> Vec<u8> {
    if size == 0 {
        panic!("random data size must be greater than 0");
    }

    let mut buffer = vec![0; size];
    rand::thread_rng().fill_bytes(&mut buffer[..]);
    buffer
}

pub fn data_source() -> DataSourceConfig {
    DataSourceConfig {
        batch_inbox_address: Address::repeat_byte(0xff),
        batcher_address: Address::repeat_byte(0xba),
    }
}

/// Fakes shared by a fully wired router.
pub struct Backends {
    pub l1: in_memory::L1,
    pub celestia: in_memory::Celestia,
    pub disperser: in_memory::Disperser,
    pub near: in_memory::NearSidecar,
    pub das: in_memory::Das,
    pub clock: TestClock,
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            l1: in_memory::L1::new(data_source().batcher_address),
            celestia: in_memory::Celestia::default(),
            disperser: in_memory::Disperser::default(),
            near: in_memory::NearSidecar::default(),
            das: in_memory::Das::default(),
            clock: TestClock::new(UNIX_EPOCH + Duration::from_secs(1_700_000_000)),
        }
    }
}

impl Backends {
    /// Router with all five backends configured, already started.
    pub fn router(&self, carrier: Carrier) -> DispatchRouter {
        self.router_with_celestia(carrier, self.celestia_service(Duration::from_secs(1)))
    }

    /// Like [`Backends::router`], with Celestia on a 12 s block time and its
    /// wait cut to fit `request_timeout`.
    pub fn router_within(
        &self,
        carrier: Carrier,
        request_timeout: Duration,
        l1_send_timeout: Duration,
    ) -> DispatchRouter {
        let celestia = self
            .celestia_service(Duration::from_secs(12))
            .within_request_timeout(request_timeout, l1_send_timeout);

        self.router_with_celestia(carrier, celestia)
    }

    fn celestia_service(
        &self,
        block_time: Duration,
    ) -> CelestiaService<in_memory::L1, in_memory::Celestia> {
        CelestiaService::new(
            self.l1.clone(),
            self.celestia.clone(),
            data_source(),
            false,
            block_time,
        )
    }

    fn router_with_celestia(
        &self,
        carrier: Carrier,
        celestia: CelestiaService<in_memory::L1, in_memory::Celestia>,
    ) -> DispatchRouter {
        let poller = ConfirmationPoller::new(Duration::from_millis(10), Duration::from_secs(1))
            .expect("valid poll settings");

        let adapters = Adapters::new()
            .with_anytrust(AnyTrustService::new(
                self.das.clone(),
                self.das.clone(),
                self.clock.clone(),
                Duration::from_secs(14 * 24 * 3600),
            ))
            .with_celestia(celestia)
            .with_eigenda(EigenDaService::new(self.disperser.clone(), poller))
            .with_eip4844(Eip4844Service::new(
                self.l1.clone(),
                self.l1.beacon(),
                data_source(),
                carrier,
            ))
            .with_nearda(NearDaService::new(self.near.clone()));

        let router = DispatchRouter::new(adapters);
        router.start().expect("fresh router to start");
        router
    }

    pub fn now(&self) -> SystemTime {
        self.clock.now()
    }
}

pub mod in_memory {
    use std::{
        collections::HashMap,
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
        },
    };

    use alloy::primitives::keccak256;
    use da_gateway_encoding::{
        anytrust::Certificate,
        blob::{self, Blob},
        nearda::FrameRef,
    };
    use services::{
        Error, Result,
        anytrust::port::{Reader, Writer},
        celestia, eigenda, nearda,
        ports::{beacon, l1},
        types::{
            Address, BlobInfo, BlobStatus, BlobStatusReply, BlockHeader,
            L1Transaction, TxRequest,
        },
    };

    fn to_blob(bytes: &[u8]) -> Blob {
        bytes
            .to_vec()
            .into_boxed_slice()
            .try_into()
            .expect("sidecar blobs to have the blob size")
    }

    #[derive(Default)]
    struct Chain {
        height: u64,
        txs: HashMap<[u8; 32], (L1Transaction, u64)>,
        blobs: HashMap<[u8; 32], Blob>,
        sent: Vec<TxRequest>,
    }

    /// An L1 that includes every transaction in its own block. Blobs become
    /// visible through [`L1::beacon`].
    #[derive(Clone)]
    pub struct L1 {
        sender: Address,
        chain: Arc<Mutex<Chain>>,
    }

    impl L1 {
        pub fn new(sender: Address) -> Self {
            Self {
                sender,
                chain: Arc::default(),
            }
        }

        pub fn beacon(&self) -> Beacon {
            Beacon {
                chain: Arc::clone(&self.chain),
            }
        }

        pub fn sent(&self) -> Vec<TxRequest> {
            self.chain.lock().unwrap().sent.clone()
        }

        /// Places a transaction on chain as if someone else had sent it.
        pub fn include_foreign(&self, tx: L1Transaction) {
            let mut chain = self.chain.lock().unwrap();
            chain.height += 1;
            let height = chain.height;
            chain.txs.insert(tx.hash, (tx, height));
        }

        fn header(height: u64) -> BlockHeader {
            BlockHeader {
                number: height,
                hash: *keccak256(height.to_be_bytes()),
                parent_hash: *keccak256(height.saturating_sub(1).to_be_bytes()),
                timestamp: 1_700_000_000 + height * 12,
                base_fee_per_gas: Some(7),
            }
        }
    }

    impl l1::Api for L1 {
        fn sender(&self) -> Address {
            self.sender
        }

        async fn suggested_priority_fee(&self) -> Result<u128> {
            Ok(1)
        }

        async fn blob_base_fee(&self) -> Result<u128> {
            Ok(1)
        }

        async fn latest_header(&self) -> Result<BlockHeader> {
            Ok(Self::header(self.chain.lock().unwrap().height))
        }

        async fn header_by_number(&self, number: u64) -> Result<Option<BlockHeader>> {
            let height = self.chain.lock().unwrap().height;
            Ok((number <= height).then(|| Self::header(number)))
        }

        async fn send_transaction(&self, tx: TxRequest) -> Result<[u8; 32]> {
            let mut chain = self.chain.lock().unwrap();
            chain.height += 1;
            let height = chain.height;

            let nonce = chain.sent.len() as u64;
            let mut preimage = nonce.to_be_bytes().to_vec();
            preimage.extend_from_slice(&tx.input);
            let hash = *keccak256(&preimage);

            let mut versioned_hashes = vec![];
            if let Some(sidecar) = &tx.sidecar {
                for (commitment, raw) in sidecar.commitments.iter().zip(&sidecar.blobs) {
                    let versioned = blob::versioned_hash(&commitment.0);
                    chain.blobs.insert(versioned, to_blob(raw.as_slice()));
                    versioned_hashes.push(versioned);
                }
            }

            let included = L1Transaction {
                hash,
                from: self.sender,
                to: Some(tx.to),
                input: tx.input.clone(),
                blob_versioned_hashes: versioned_hashes,
            };
            chain.txs.insert(hash, (included, height));
            chain.sent.push(tx);

            Ok(hash)
        }

        async fn transaction(&self, hash: [u8; 32]) -> Result<Option<L1Transaction>> {
            let chain = self.chain.lock().unwrap();
            Ok(chain.txs.get(&hash).map(|(tx, _)| tx.clone()))
        }

        async fn inclusion_block(&self, hash: [u8; 32]) -> Result<Option<u64>> {
            let chain = self.chain.lock().unwrap();
            Ok(chain.txs.get(&hash).map(|(_, height)| *height))
        }
    }

    #[derive(Clone)]
    pub struct Beacon {
        chain: Arc<Mutex<Chain>>,
    }

    impl beacon::Api for Beacon {
        async fn blobs(
            &self,
            _block: BlockHeader,
            versioned_hashes: Vec<[u8; 32]>,
        ) -> Result<Vec<Blob>> {
            let chain = self.chain.lock().unwrap();
            versioned_hashes
                .iter()
                .map(|hash| {
                    chain
                        .blobs
                        .get(hash)
                        .cloned()
                        .ok_or_else(|| Error::Other(format!("no sidecar for {}", hex_of(hash))))
                })
                .collect()
        }
    }

    fn hex_of(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Celestia DA proxy. Can be switched off to exercise the eth fallback.
    #[derive(Clone, Default)]
    pub struct Celestia {
        blobs: Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>,
        unavailable: Arc<AtomicBool>,
        hanging: Arc<AtomicBool>,
    }

    impl Celestia {
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Submissions never complete while set.
        pub fn set_hanging(&self, hanging: bool) {
            self.hanging.store(hanging, Ordering::SeqCst);
        }

        pub fn stored(&self) -> usize {
            self.blobs.lock().unwrap().len()
        }
    }

    impl celestia::port::Api for Celestia {
        async fn submit(&self, blobs: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>> {
            if self.hanging.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(Error::Network("celestia is unavailable".to_string()));
            }

            let mut stored = self.blobs.lock().unwrap();
            Ok(blobs
                .into_iter()
                .map(|blob| {
                    let mut id = (stored.len() as u64 + 1).to_be_bytes().to_vec();
                    id.extend_from_slice(&keccak256(&blob)[..8]);
                    stored.insert(id.clone(), blob);
                    id
                })
                .collect())
        }

        async fn get(&self, ids: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>> {
            let stored = self.blobs.lock().unwrap();
            Ok(ids.iter().filter_map(|id| stored.get(id).cloned()).collect())
        }
    }

    #[derive(Default)]
    struct Dispersals {
        blobs: HashMap<Vec<u8>, (Vec<u8>, u32)>,
        status_queries: HashMap<Vec<u8>, u32>,
    }

    /// EigenDA disperser confirming each blob after a configurable number of
    /// status queries.
    #[derive(Clone, Default)]
    pub struct Disperser {
        dispersals: Arc<Mutex<Dispersals>>,
        pending_queries: Arc<AtomicU32>,
        next_id: Arc<AtomicU64>,
    }

    impl Disperser {
        pub fn confirm_after(&self, queries: u32) {
            self.pending_queries.store(queries, Ordering::SeqCst);
        }
    }

    impl eigenda::port::Api for Disperser {
        async fn disperse_blob(&self, data: Vec<u8>) -> Result<Vec<u8>> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let request_id = keccak256(id.to_be_bytes()).to_vec();
            let index = id as u32;

            self.dispersals
                .lock()
                .unwrap()
                .blobs
                .insert(request_id.clone(), (data, index));

            Ok(request_id)
        }

        async fn blob_status(&self, request_id: Vec<u8>) -> Result<BlobStatusReply> {
            let mut dispersals = self.dispersals.lock().unwrap();
            let Some((_, index)) = dispersals.blobs.get(&request_id).cloned() else {
                return Ok(BlobStatusReply {
                    status: BlobStatus::Unknown,
                    info: None,
                });
            };

            let queries = dispersals
                .status_queries
                .entry(request_id.clone())
                .or_default();
            *queries += 1;
            if *queries <= self.pending_queries.load(Ordering::SeqCst) {
                return Ok(BlobStatusReply::pending());
            }

            Ok(BlobStatusReply {
                status: BlobStatus::Confirmed,
                info: Some(BlobInfo {
                    batch_header_hash: request_id,
                    blob_index: index,
                }),
            })
        }

        async fn retrieve_blob(&self, batch_header_hash: Vec<u8>, blob_index: u32) -> Result<Vec<u8>> {
            let dispersals = self.dispersals.lock().unwrap();
            match dispersals.blobs.get(&batch_header_hash) {
                Some((data, index)) if *index == blob_index => Ok(data.clone()),
                _ => Err(Error::Other("no such blob".to_string())),
            }
        }
    }

    #[derive(Clone, Default)]
    pub struct NearSidecar {
        frames: Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>,
    }

    impl nearda::port::Api for NearSidecar {
        async fn submit(&self, data: Vec<u8>) -> Result<Vec<u8>> {
            let mut frames = self.frames.lock().unwrap();
            let mut frame = keccak256(&data).to_vec();
            frame.extend_from_slice(&(frames.len() as u32).to_be_bytes());
            frames.insert(frame.clone(), data);

            Ok(frame)
        }

        async fn get(&self, frame: FrameRef) -> Result<Vec<u8>> {
            self.frames
                .lock()
                .unwrap()
                .get(frame.as_bytes())
                .cloned()
                .ok_or_else(|| Error::Other("unknown frame".to_string()))
        }
    }

    /// A single member DAS committee.
    #[derive(Clone, Default)]
    pub struct Das {
        messages: Arc<Mutex<HashMap<[u8; 32], Vec<u8>>>>,
    }

    impl Writer for Das {
        async fn store(&self, message: Vec<u8>, timeout: u64) -> Result<Certificate> {
            let data_hash = *keccak256(&message);
            self.messages.lock().unwrap().insert(data_hash, message);

            Ok(Certificate {
                keyset_hash: [0x4e; 32],
                data_hash,
                timeout,
                signers_mask: 1,
                signature: [0; 96],
                version: 0,
            })
        }
    }

    impl Reader for Das {
        async fn get_by_hash(&self, data_hash: [u8; 32]) -> Result<Vec<u8>> {
            self.messages
                .lock()
                .unwrap()
                .get(&data_hash)
                .cloned()
                .ok_or_else(|| Error::Other(format!("no message for {}", hex_of(&data_hash))))
        }
    }
}
