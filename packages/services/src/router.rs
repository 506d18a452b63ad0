use std::{collections::HashMap, sync::Arc, time::Instant};

use async_trait::async_trait;
use metrics::{
    FailureStreak, HealthChecker, RegistersMetrics,
    prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, core::Collector},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    Error, HealthReporter, Result,
    lifecycle::{Lifecycle, State},
    types::{BackendType, BlobVerification, DaReference, Submission},
};

/// A DA backend. A reference returned by `submit` is only meaningful to the
/// same adapter's `retrieve`.
#[cfg_attr(feature = "test-helpers", mockall::automock)]
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    async fn submit(&self, payload: Vec<u8>) -> Result<Submission>;
    async fn retrieve(&self, reference: DaReference) -> Result<Vec<u8>>;
}

/// Backends with deferred finality that can block until a dispersal settles.
#[cfg_attr(feature = "test-helpers", mockall::automock)]
#[async_trait]
pub trait AwaitsConfirmation: Send + Sync {
    async fn disperse_and_wait(
        &self,
        payload: Vec<u8>,
        cancel: CancellationToken,
    ) -> Result<BlobVerification>;
}

/// Fixed table of configured backends, assembled once at startup.
#[derive(Default, Clone)]
pub struct Adapters {
    table: HashMap<BackendType, Arc<dyn BackendAdapter>>,
    confirmations: Option<Arc<dyn AwaitsConfirmation>>,
}

impl Adapters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anytrust(self, adapter: impl BackendAdapter + 'static) -> Self {
        self.with(BackendType::AnyTrust, adapter)
    }

    pub fn with_celestia(self, adapter: impl BackendAdapter + 'static) -> Self {
        self.with(BackendType::Celestia, adapter)
    }

    pub fn with_eigenda<A>(mut self, adapter: A) -> Self
    where
        A: BackendAdapter + AwaitsConfirmation + 'static,
    {
        let adapter = Arc::new(adapter);
        self.confirmations = Some(Arc::clone(&adapter) as Arc<dyn AwaitsConfirmation>);
        self.table.insert(BackendType::EigenDA, adapter);
        self
    }

    pub fn with_eip4844(self, adapter: impl BackendAdapter + 'static) -> Self {
        self.with(BackendType::Eip4844, adapter)
    }

    pub fn with_nearda(self, adapter: impl BackendAdapter + 'static) -> Self {
        self.with(BackendType::NearDA, adapter)
    }

    pub fn configured(&self) -> Vec<BackendType> {
        let mut backends: Vec<_> = self.table.keys().copied().collect();
        backends.sort();
        backends
    }

    fn with(mut self, backend: BackendType, adapter: impl BackendAdapter + 'static) -> Self {
        self.table.insert(backend, Arc::new(adapter));
        self
    }
}

#[derive(Clone)]
struct Metrics {
    submissions: IntCounterVec,
    retrievals: IntCounterVec,
    failures: IntCounterVec,
    duration: HistogramVec,
}

impl Default for Metrics {
    fn default() -> Self {
        let submissions = IntCounterVec::new(
            Opts::new("da_submissions_total", "Number of successful submissions"),
            &["backend"],
        )
        .expect("da_submissions_total metric to be correctly configured");

        let retrievals = IntCounterVec::new(
            Opts::new("da_retrievals_total", "Number of successful retrievals"),
            &["backend"],
        )
        .expect("da_retrievals_total metric to be correctly configured");

        let failures = IntCounterVec::new(
            Opts::new("da_failures_total", "Number of failed requests by error kind"),
            &["backend", "kind"],
        )
        .expect("da_failures_total metric to be correctly configured");

        let duration = HistogramVec::new(
            HistogramOpts::new(
                "da_request_duration_seconds",
                "Time spent waiting on a backend",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
            &["backend", "op"],
        )
        .expect("da_request_duration_seconds metric to be correctly configured");

        Self {
            submissions,
            retrievals,
            failures,
            duration,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Submit,
    Retrieve,
    DisperseAndWait,
}

impl Op {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Retrieve => "retrieve",
            Self::DisperseAndWait => "disperse_and_wait",
        }
    }
}

const UNHEALTHY_AFTER_FAILURES: usize = 3;

/// Routes requests to the adapter configured for their backend type.
pub struct DispatchRouter {
    adapters: Adapters,
    lifecycle: Lifecycle,
    health: HashMap<BackendType, FailureStreak>,
    metrics: Metrics,
}

impl RegistersMetrics for DispatchRouter {
    fn metrics(&self) -> Vec<Box<dyn Collector>> {
        vec![
            Box::new(self.metrics.submissions.clone()),
            Box::new(self.metrics.retrievals.clone()),
            Box::new(self.metrics.failures.clone()),
            Box::new(self.metrics.duration.clone()),
        ]
    }
}

impl DispatchRouter {
    pub fn new(adapters: Adapters) -> Self {
        let health = adapters
            .table
            .keys()
            .map(|backend| (*backend, FailureStreak::new(UNHEALTHY_AFTER_FAILURES)))
            .collect();

        Self {
            adapters,
            lifecycle: Lifecycle::new(),
            health,
            metrics: Metrics::default(),
        }
    }

    pub fn start(&self) -> Result<()> {
        self.lifecycle.start()
    }

    /// Cancels in flight confirmation waits. Stopping twice fails with
    /// [`Error::AlreadyStopped`].
    pub fn stop(&self) -> Result<()> {
        self.lifecycle.stop()
    }

    pub fn state(&self) -> State {
        self.lifecycle.state()
    }

    pub fn configured(&self) -> Vec<BackendType> {
        self.adapters.configured()
    }

    pub fn health_reporter(&self) -> HealthReporter {
        let mut backends: Vec<_> = self.health.iter().collect();
        backends.sort_by_key(|(backend, _)| **backend);

        backends
            .into_iter()
            .fold(HealthReporter::new(), |reporter, (backend, streak)| {
                reporter.with_backend(*backend, streak.tracker())
            })
    }

    pub fn health_check(&self, backend: BackendType) -> Option<HealthChecker> {
        self.health.get(&backend).map(FailureStreak::tracker)
    }

    pub async fn submit(&self, payload: Vec<u8>, backend: BackendType) -> Result<Submission> {
        self.lifecycle.ensure_running()?;
        if payload.is_empty() {
            return Err(Error::InvalidInput("payload must not be empty".to_string()));
        }
        let adapter = self.adapter(backend)?;

        let size = payload.len();
        let outcome = self
            .observe(backend, Op::Submit, adapter.submit(payload))
            .await;

        match outcome {
            Ok(submission) => {
                info!("submitted {size} bytes to {backend}, reference {}", submission.reference);
                self.metrics
                    .submissions
                    .with_label_values(&[backend.as_str()])
                    .inc();
                Ok(submission)
            }
            Err(e) => Err(classify(e, |source| Error::SubmissionFailed { backend, source })),
        }
    }

    /// Accepts the integer tag used on the wire.
    pub async fn submit_tagged(&self, payload: Vec<u8>, tag: i64) -> Result<Submission> {
        let backend = BackendType::try_from(tag)?;
        self.submit(payload, backend).await
    }

    pub async fn retrieve(&self, backend: BackendType, reference: DaReference) -> Result<Vec<u8>> {
        self.lifecycle.ensure_running()?;
        if reference.as_str().is_empty() {
            return Err(Error::InvalidInput("reference must not be empty".to_string()));
        }
        let adapter = self.adapter(backend)?;

        let outcome = self
            .observe(backend, Op::Retrieve, adapter.retrieve(reference))
            .await;

        match outcome {
            Ok(payload) => {
                info!("retrieved {} bytes from {backend}", payload.len());
                self.metrics
                    .retrievals
                    .with_label_values(&[backend.as_str()])
                    .inc();
                Ok(payload)
            }
            Err(e) => Err(classify(e, |source| Error::RetrievalFailed { backend, source })),
        }
    }

    pub async fn retrieve_tagged(&self, tag: i64, reference: DaReference) -> Result<Vec<u8>> {
        let backend = BackendType::try_from(tag)?;
        self.retrieve(backend, reference).await
    }

    /// Disperses to EigenDA and waits for the blob to be confirmed. Stopping
    /// the router aborts the wait with [`Error::Cancelled`].
    pub async fn disperse_and_wait(&self, payload: Vec<u8>) -> Result<BlobVerification> {
        self.lifecycle.ensure_running()?;
        if payload.is_empty() {
            return Err(Error::InvalidInput("payload must not be empty".to_string()));
        }
        let backend = BackendType::EigenDA;
        let confirmations = self
            .adapters
            .confirmations
            .as_ref()
            .ok_or(Error::BackendNotPrepared(backend))?;

        let cancel = self.lifecycle.child_token();
        self.observe(
            backend,
            Op::DisperseAndWait,
            confirmations.disperse_and_wait(payload, cancel),
        )
        .await
        .map_err(|e| classify(e, |source| Error::SubmissionFailed { backend, source }))
    }

    fn adapter(&self, backend: BackendType) -> Result<&Arc<dyn BackendAdapter>> {
        self.adapters
            .table
            .get(&backend)
            .ok_or(Error::BackendNotPrepared(backend))
    }

    async fn observe<T>(
        &self,
        backend: BackendType,
        op: Op,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let started = Instant::now();
        let outcome = fut.await;
        self.metrics
            .duration
            .with_label_values(&[backend.as_str(), op.as_str()])
            .observe(started.elapsed().as_secs_f64());

        if let Some(streak) = self.health.get(&backend) {
            match &outcome {
                Err(e) if e.is_network() => streak.note_failure(),
                _ => streak.note_success(),
            }
        }

        if let Err(e) = &outcome {
            error!("{} on {backend} failed: {e}", op.as_str());
            self.metrics
                .failures
                .with_label_values(&[backend.as_str(), e.kind().as_str()])
                .inc();
        }

        outcome
    }
}

/// Network and uncategorized faults get wrapped with the backend they came
/// from. Everything else already carries its kind.
fn classify(error: Error, wrap: impl FnOnce(Box<Error>) -> Error) -> Error {
    match error {
        Error::Network(_) | Error::Other(_) => wrap(Box::new(error)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::{BlobInfo, BlobStatus};

    fn running(adapters: Adapters) -> DispatchRouter {
        let router = DispatchRouter::new(adapters);
        router.start().unwrap();
        router
    }

    #[tokio::test]
    async fn empty_payload_never_reaches_the_adapter() {
        // given
        let mut adapter = MockBackendAdapter::new();
        adapter.expect_submit().never();
        let router = running(Adapters::new().with_nearda(adapter));

        // when
        let err = router.submit(vec![], BackendType::NearDA).await.unwrap_err();

        // then
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unknown_tag_is_rejected() {
        let mut adapter = MockBackendAdapter::new();
        adapter.expect_submit().never();
        let router = running(Adapters::new().with_nearda(adapter));

        let err = router.submit_tagged(vec![1], 9).await.unwrap_err();

        assert!(matches!(err, Error::UnknownBackendType(9)));
    }

    #[tokio::test]
    async fn missing_adapter_is_not_prepared() {
        let router = running(Adapters::new());

        let err = router
            .retrieve(BackendType::Celestia, "0x01".into())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::BackendNotPrepared(BackendType::Celestia)));
    }

    #[tokio::test]
    async fn requests_need_a_running_router() {
        // given
        let mut adapter = MockBackendAdapter::new();
        adapter.expect_submit().never();
        let router = DispatchRouter::new(Adapters::new().with_anytrust(adapter));

        // when
        let before_start = router.submit(vec![1], BackendType::AnyTrust).await;
        router.start().unwrap();
        router.stop().unwrap();
        let after_stop = router.submit(vec![1], BackendType::AnyTrust).await;

        // then
        assert!(matches!(before_start, Err(Error::NotRunning)));
        assert!(matches!(after_stop, Err(Error::NotRunning)));
        assert!(matches!(router.stop(), Err(Error::AlreadyStopped)));
    }

    #[tokio::test]
    async fn network_errors_are_wrapped_with_the_backend() {
        // given
        let mut adapter = MockBackendAdapter::new();
        adapter
            .expect_submit()
            .returning(|_| Err(Error::Network("connection refused".to_string())));
        let router = running(Adapters::new().with_celestia(adapter));

        // when
        let err = router.submit(vec![1], BackendType::Celestia).await.unwrap_err();

        // then
        let Error::SubmissionFailed { backend, source } = err else {
            panic!("expected a submission failure, got {err:?}");
        };
        assert_eq!(backend, BackendType::Celestia);
        assert!(matches!(*source, Error::Network(_)));
    }

    #[tokio::test]
    async fn classified_errors_pass_through_unchanged() {
        let mut adapter = MockBackendAdapter::new();
        adapter
            .expect_retrieve()
            .returning(|_| Err(Error::StillPending("processing".to_string())));
        let router = running(Adapters::new().with_eip4844(adapter));

        let err = router
            .retrieve(BackendType::Eip4844, "0xab".into())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::StillPending(_)));
    }

    #[tokio::test]
    async fn repeated_network_failures_mark_the_backend_unhealthy() {
        // given
        let mut adapter = MockBackendAdapter::new();
        adapter
            .expect_retrieve()
            .returning(|_| Err(Error::Network("timeout".to_string())));
        let router = running(Adapters::new().with_nearda(adapter));
        let health = router.health_check(BackendType::NearDA).unwrap();

        // when
        for _ in 0..UNHEALTHY_AFTER_FAILURES {
            assert!(health.healthy());
            let _ = router.retrieve(BackendType::NearDA, "AQ==".into()).await;
        }

        // then
        assert!(!health.healthy());
        assert!(!router.health_reporter().generate_report().is_healthy());
    }

    #[tokio::test]
    async fn disperse_and_wait_is_routed_to_eigenda() {
        // given
        struct Confirming;

        #[async_trait]
        impl BackendAdapter for Confirming {
            async fn submit(&self, _: Vec<u8>) -> Result<Submission> {
                Ok(Submission::new(BackendType::EigenDA, "AQ=="))
            }
            async fn retrieve(&self, _: DaReference) -> Result<Vec<u8>> {
                Ok(vec![])
            }
        }

        #[async_trait]
        impl AwaitsConfirmation for Confirming {
            async fn disperse_and_wait(
                &self,
                _: Vec<u8>,
                _: CancellationToken,
            ) -> Result<BlobVerification> {
                Ok(BlobVerification {
                    request_id: vec![1],
                    status: BlobStatus::Confirmed,
                    info: BlobInfo {
                        batch_header_hash: vec![2],
                        blob_index: 3,
                    },
                })
            }
        }

        let router = running(Adapters::new().with_eigenda(Confirming));

        // when
        let verification = router.disperse_and_wait(vec![1]).await.unwrap();

        // then
        assert_eq!(verification.info.blob_index, 3);
        assert_eq!(router.configured(), vec![BackendType::EigenDA]);
    }

    #[tokio::test]
    async fn disperse_and_wait_without_eigenda_is_not_prepared() {
        let router = running(Adapters::new());

        let err = router.disperse_and_wait(vec![1]).await.unwrap_err();

        assert!(matches!(err, Error::BackendNotPrepared(BackendType::EigenDA)));
    }
}
