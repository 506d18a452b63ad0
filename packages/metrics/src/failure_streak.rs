use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use super::{HealthCheck, HealthChecker};

/// Counts consecutive failed calls against a remote service. Any success
/// resets the streak.
#[derive(Debug, Clone)]
pub struct FailureStreak {
    threshold: usize,
    current: Arc<AtomicUsize>,
}

impl FailureStreak {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            current: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn record<T, E>(&self, outcome: &Result<T, E>) {
        match outcome {
            Ok(_) => self.current.store(0, Ordering::SeqCst),
            Err(_) => {
                self.current.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    pub fn note_failure(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    pub fn note_success(&self) {
        self.current.store(0, Ordering::SeqCst);
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub fn tracker(&self) -> HealthChecker {
        Box::new(self.clone())
    }
}

impl HealthCheck for FailureStreak {
    fn healthy(&self) -> bool {
        self.current() < self.threshold
    }
}
