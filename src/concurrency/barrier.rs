//! Level barrier for breadth-first traversal.
//!
//! Counts the asynchronous units (downloads and extractions) outstanding for
//! the current BFS level. A unit is a [`LevelUnit`] guard: registering
//! increments the count and dropping the guard decrements it, so every exit
//! path of a unit (success, error, panic, or a job that never ran because its
//! pool closed) deregisters exactly once.
//!
//! ## Submission hold
//!
//! A level is not complete until the driver has finished *submitting* all of
//! that level's work. The driver registers a standing unit before it submits
//! the first URL of a level and hands it to
//! [`LevelBarrier::await_level_done`] only after the last URL was submitted.
//! Without it the count could reach zero between two submissions (or while a
//! finished download is about to register its extraction) and release the
//! driver early.

use std::sync::Arc;

use tokio::sync::watch;

/// Reusable synchronization point that releases the driver once every unit
/// of the current level has finished.
#[derive(Debug, Clone)]
pub struct LevelBarrier {
    outstanding: Arc<watch::Sender<usize>>,
}

/// One registered unit of work. Deregisters on drop.
#[derive(Debug)]
#[must_use = "dropping a LevelUnit immediately deregisters it"]
pub struct LevelUnit {
    outstanding: Arc<watch::Sender<usize>>,
}

impl LevelBarrier {
    pub fn new() -> Self {
        let (outstanding, _) = watch::channel(0);
        Self {
            outstanding: Arc::new(outstanding),
        }
    }

    /// Register a new unit for the current level.
    ///
    /// May be called while the driver is already waiting in
    /// [`await_level_done`](Self::await_level_done).
    pub fn register(&self) -> LevelUnit {
        self.outstanding.send_modify(|count| *count += 1);
        LevelUnit {
            outstanding: Arc::clone(&self.outstanding),
        }
    }

    /// Number of units currently registered.
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Release the driver's standing unit and wait until every unit of the
    /// level has deregistered.
    pub async fn await_level_done(&self, standing: LevelUnit) {
        let mut count = self.outstanding.subscribe();
        drop(standing);
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = count.wait_for(|outstanding| *outstanding == 0).await;
    }
}

impl Default for LevelBarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LevelUnit {
    fn drop(&mut self) {
        self.outstanding.send_modify(|count| {
            debug_assert!(*count > 0, "level unit deregistered twice");
            *count = count.saturating_sub(1);
        });
    }
}
