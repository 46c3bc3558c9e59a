use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::error::{AuditError, Result};

/// Runs CPU-bound work on tokio's blocking threads, with at most `capacity`
/// jobs in flight. Callers beyond the limit wait for a permit.
#[derive(Debug, Clone)]
pub struct FitPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl FitPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Pool sized to the number of available cores.
    pub fn with_available_parallelism() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(cores)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn run<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AuditError::Worker(e.to_string()))?;
        debug!(available = self.permits.available_permits(), "Acquired fit permit");

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| {
            error!("Fit task failed: {}", e);
            AuditError::Worker(e.to_string())
        })
    }
}

impl Default for FitPool {
    fn default() -> Self {
        Self::with_available_parallelism()
    }
}
