use std::collections::BTreeMap;

use metrics::HealthChecker;
use serde::Serialize;

use crate::types::BackendType;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    backends: BTreeMap<&'static str, bool>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.backends.values().all(|healthy| *healthy)
    }

    pub fn backend(&self, backend: BackendType) -> Option<bool> {
        self.backends.get(backend.as_str()).copied()
    }
}

/// Health of every configured backend. Unconfigured backends are left out of
/// the report.
#[derive(Default)]
pub struct HealthReporter {
    checks: Vec<(BackendType, HealthChecker)>,
}

impl HealthReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_backend(mut self, backend: BackendType, check: HealthChecker) -> Self {
        self.checks.push((backend, check));
        self
    }

    #[must_use]
    pub fn generate_report(&self) -> HealthReport {
        HealthReport {
            backends: self
                .checks
                .iter()
                .map(|(backend, check)| (backend.as_str(), check.healthy()))
                .collect(),
        }
    }
}
