use std::{future::Future, sync::Arc, time::Duration};

use da_gateway_encoding::reference;
use services::{
    DispatchRouter, HealthReport,
    types::{DaReference, Submission},
};
use tracing::error;

/// What both transports serve: base64 payloads routed by their raw backend
/// tag, each request bounded by the configured timeout.
pub struct Dispatcher {
    router: Arc<DispatchRouter>,
    request_timeout: Duration,
}

impl Dispatcher {
    pub fn new(router: Arc<DispatchRouter>, request_timeout: Duration) -> Self {
        Self {
            router,
            request_timeout,
        }
    }

    pub async fn submit(&self, da_type: i64, data: &str) -> services::Result<Submission> {
        let payload = reference::from_base64(data)
            .map_err(|e| services::Error::InvalidInput(format!("data is not base64: {e}")))?;

        let result = self
            .bounded(self.router.submit_tagged(payload, da_type))
            .await;
        if let Err(e) = &result {
            error!("submission to backend {da_type} failed: {e}");
        }

        result
    }

    /// Returns the payload base64 encoded.
    pub async fn retrieve(&self, da_type: i64, da_reference: String) -> services::Result<String> {
        let result = self
            .bounded(
                self.router
                    .retrieve_tagged(da_type, DaReference::new(da_reference)),
            )
            .await;

        match result {
            Ok(payload) => Ok(reference::to_base64(payload)),
            Err(e) => {
                error!("retrieval from backend {da_type} failed: {e}");
                Err(e)
            }
        }
    }

    pub fn health_report(&self) -> HealthReport {
        self.router.health_reporter().generate_report()
    }

    async fn bounded<T>(
        &self,
        request: impl Future<Output = services::Result<T>>,
    ) -> services::Result<T> {
        tokio::time::timeout(self.request_timeout, request)
            .await
            .map_err(|_| {
                services::Error::Timeout(format!(
                    "request not served within {}",
                    humantime::format_duration(self.request_timeout)
                ))
            })?
    }
}
