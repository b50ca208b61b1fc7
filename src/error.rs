//! Infrastructure failures and the fatal path.
//!
//! The engine models a single class of failure: the platform's threading or
//! locking primitives misbehaving. None of these are recoverable at the job
//! level. They are propagated internally as `EngineError` and escalated at the
//! thread boundary through `fatal()`, which logs and aborts the process. The
//! crate's own unit tests panic instead, so the failure can be asserted on.

use std::io;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("parallelism must be at least 1, got {0}")]
    InvalidParallelism(usize),

    #[error("couldn't spawn worker thread {worker}: {source}")]
    ThreadSpawn {
        worker: usize,
        #[source]
        source: io::Error,
    },

    #[error("{what} mutex is poisoned")]
    Poisoned { what: &'static str },

    #[error("worker thread {worker} panicked")]
    WorkerPanicked { worker: usize },

    #[error("grouped runs were published twice")]
    RunsAlreadyPublished,
}

/// Locks `m`, turning poisoning into an `EngineError` naming the lock.
pub fn lock<'a, T>(m: &'a Mutex<T>, what: &'static str) -> Result<MutexGuard<'a, T>, EngineError> {
    m.lock().map_err(|_| EngineError::Poisoned { what })
}

/// Reports an infrastructure failure and never returns.
#[cfg(not(test))]
pub fn fatal(err: EngineError) -> ! {
    tracing::error!(error = %err, "system error");
    eprintln!("system error: {}", err);
    std::process::abort()
}

#[cfg(test)]
pub fn fatal(err: EngineError) -> ! {
    tracing::error!(error = %err, "system error");
    panic!("system error: {}", err)
}
