//! Fixed-size worker pool.
//!
//! `size` long-lived Tokio tasks pull jobs from a shared queue and run them
//! one at a time, so at most `size` jobs of a pool are in flight at once.
//! Submission never blocks.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};

/// A unit of work accepted by a [`WorkerPool`].
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>>;

/// Bounded pool of workers executing [`Job`]s.
#[derive(Debug)]
pub struct WorkerPool {
    name: String,
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    active: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Spawn a pool of `size` workers on the current Tokio runtime.
    pub fn new(name: impl Into<String>, size: usize) -> Result<Self> {
        let name = name.into();
        if size == 0 {
            return Err(AppError::config(format!(
                "{name} pool needs at least one worker"
            )));
        }
        let runtime = Handle::try_current()
            .map_err(|e| AppError::Runtime(format!("cannot start {name} pool: {e}")))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver: SharedReceiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let active = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..size)
            .map(|id| {
                runtime.spawn(worker_loop(
                    name.clone(),
                    id,
                    Arc::clone(&receiver),
                    Arc::clone(&active),
                ))
            })
            .collect();

        log::debug!("Started {} pool with {} workers", name, size);

        Ok(Self {
            name,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            active,
        })
    }

    /// Number of jobs currently running.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Queue a job for execution.
    ///
    /// Fails with [`AppError::PoolClosed`] once the pool is closed; the
    /// rejected job is dropped without running.
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Rejected jobs drop their guards, which may re-enter the pool.
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match sender {
            Some(sender) => sender
                .send(Box::pin(job))
                .map_err(|_| AppError::PoolClosed),
            None => Err(AppError::PoolClosed),
        }
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Stop accepting new jobs. Already queued jobs still run.
    pub fn close(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_some() {
            log::debug!("Closed {} pool", self.name);
        }
    }

    /// Close the pool, let workers drain for at most `grace`, then abort
    /// whatever is still running.
    pub async fn shutdown(&self, grace: Duration) {
        self.close();

        let workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let aborts: Vec<_> = workers.iter().map(JoinHandle::abort_handle).collect();

        if tokio::time::timeout(grace, futures::future::join_all(workers))
            .await
            .is_err()
        {
            log::warn!(
                "{} pool did not drain within {:?}; aborting {} running job(s)",
                self.name,
                grace,
                self.active()
            );
            for abort in aborts {
                abort.abort();
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let workers = self.workers.get_mut().unwrap_or_else(PoisonError::into_inner);
        for worker in workers.drain(..) {
            worker.abort();
        }
    }
}

async fn worker_loop(name: String, id: usize, jobs: SharedReceiver, active: Arc<AtomicUsize>) {
    loop {
        let job = jobs.lock().await.recv().await;
        let Some(job) = job else { break };

        active.fetch_add(1, Ordering::SeqCst);
        let outcome = AssertUnwindSafe(job).catch_unwind().await;
        active.fetch_sub(1, Ordering::SeqCst);

        if outcome.is_err() {
            log::error!("{} worker {} recovered from a panicking job", name, id);
        }
    }
    log::debug!("{} worker {} stopped", name, id);
}
