use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{debug, error};

/// A unit of deferred work. It is responsible for reporting its own completion.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Background executor for deferred command bodies, shared by every connection.
///
/// Implementations must never run the job on the calling thread before `submit`
/// returns: the caller may be holding its connection's lock.
pub trait WorkerPool: Send + Sync {
    fn submit(&self, job: Job);
}

/// Runs jobs on the tokio blocking thread pool, at most `workers` at a time.
pub struct TokioWorkerPool {
    handle: Handle,
    permits: Arc<Semaphore>,
}

impl TokioWorkerPool {
    pub fn new(handle: Handle, workers: usize) -> TokioWorkerPool {
        TokioWorkerPool {
            handle,
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Builds a pool on the runtime the caller is running in.
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn current(workers: usize) -> TokioWorkerPool {
        Self::new(Handle::current(), workers)
    }
}

impl WorkerPool for TokioWorkerPool {
    fn submit(&self, job: Job) {
        let permits = self.permits.clone();
        let handle = self.handle.clone();

        self.handle.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                debug!("Worker pool closed, dropping job");
                return;
            };
            match handle.spawn_blocking(job).await {
                Ok(()) => {}
                Err(e) if e.is_panic() => error!("Deferred job panicked: {}", e),
                Err(e) => debug!("Deferred job did not finish: {}", e),
            }
        });
    }
}
