//! Per-host admission control in front of the download pool.
//!
//! Each host gets a lazily created [`HostQueue`] holding an in-flight counter
//! and a FIFO of deferred tasks. Admission (check capacity, then dispatch or
//! enqueue) and hand-over (dequeue next or free the slot) both happen under
//! that host's lock. The pool itself is never entered while a host lock is
//! held, since a rejected job releases its slot from `Drop`.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

use super::pool::{Job, WorkerPool};

/// Per-host state: at most `capacity` tasks in flight, the rest pending.
#[derive(Default)]
struct HostQueue {
    in_flight: usize,
    pending: VecDeque<Job>,
}

/// Per-host FIFO gate bounding concurrent downloads to each host.
///
/// Scoped to a single crawl; the global cap is still enforced by the pool
/// the gate dispatches into.
pub struct HostGate {
    capacity: usize,
    pool: Arc<WorkerPool>,
    hosts: DashMap<String, Arc<Mutex<HostQueue>>>,
}

/// Slot held by a dispatched task; frees or hands over the slot on drop.
struct HostSlot {
    gate: Arc<HostGate>,
    queue: Arc<Mutex<HostQueue>>,
}

enum Release {
    Dispatch(Job),
    Freed,
    Discard(VecDeque<Job>),
}

impl HostGate {
    /// `capacity` must be at least 1.
    pub fn new(capacity: usize, pool: Arc<WorkerPool>) -> Self {
        debug_assert!(capacity > 0, "host capacity must be > 0");
        Self {
            capacity,
            pool,
            hosts: DashMap::new(),
        }
    }

    /// Run `task` under `host`'s concurrency budget.
    ///
    /// The task is dispatched to the pool at once if the host has a free
    /// slot, otherwise it waits in the host's FIFO queue.
    pub fn schedule<F>(self: &Arc<Self>, host: &str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let queue = self.queue_for(host);
        let task: Job = Box::pin(task);

        let admitted = {
            let mut state = lock(&queue);
            if state.in_flight < self.capacity {
                state.in_flight += 1;
                Some(task)
            } else {
                state.pending.push_back(task);
                None
            }
        };

        if let Some(task) = admitted {
            self.dispatch(queue, task);
        }
    }

    /// Tasks currently in flight for `host`.
    pub fn in_flight(&self, host: &str) -> usize {
        self.hosts
            .get(host)
            .map_or(0, |queue| {
                let state = lock(queue.value());
                state.in_flight
            })
    }

    /// Tasks waiting for a slot on `host`.
    pub fn pending(&self, host: &str) -> usize {
        self.hosts
            .get(host)
            .map_or(0, |queue| {
                let state = lock(queue.value());
                state.pending.len()
            })
    }

    fn queue_for(&self, host: &str) -> Arc<Mutex<HostQueue>> {
        if let Some(queue) = self.hosts.get(host) {
            return Arc::clone(queue.value());
        }
        Arc::clone(
            self.hosts
                .entry(host.to_string())
                .or_default()
                .value(),
        )
    }

    fn dispatch(self: &Arc<Self>, queue: Arc<Mutex<HostQueue>>, task: Job) {
        let slot = HostSlot {
            gate: Arc::clone(self),
            queue,
        };
        let job = async move {
            let _slot = slot;
            task.await;
        };
        if let Err(e) = self.pool.submit(job) {
            log::debug!("Dropping host task: {}", e);
        }
    }

    fn release(self: &Arc<Self>, queue: &Arc<Mutex<HostQueue>>) {
        let next = {
            let mut state = lock(queue);
            if self.pool.is_closed() {
                state.in_flight = state.in_flight.saturating_sub(1);
                Release::Discard(std::mem::take(&mut state.pending))
            } else if let Some(task) = state.pending.pop_front() {
                Release::Dispatch(task)
            } else {
                state.in_flight = state.in_flight.saturating_sub(1);
                Release::Freed
            }
        };

        match next {
            Release::Dispatch(task) => self.dispatch(Arc::clone(queue), task),
            Release::Discard(tasks) => {
                if !tasks.is_empty() {
                    log::debug!("Discarding {} queued host tasks after pool close", tasks.len());
                }
            }
            Release::Freed => {}
        }
    }
}

impl Drop for HostSlot {
    fn drop(&mut self) {
        self.gate.release(&self.queue);
    }
}

fn lock(queue: &Mutex<HostQueue>) -> MutexGuard<'_, HostQueue> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::concurrency::LevelBarrier;

    #[derive(Default)]
    struct Tracker {
        current: Mutex<HashMap<String, usize>>,
        peak: Mutex<HashMap<String, usize>>,
    }

    impl Tracker {
        fn enter(&self, host: &str) {
            let mut current = self.current.lock().unwrap();
            let now = current.entry(host.to_string()).or_default();
            *now += 1;
            let mut peak = self.peak.lock().unwrap();
            let max = peak.entry(host.to_string()).or_default();
            *max = (*max).max(*now);
        }

        fn leave(&self, host: &str) {
            *self.current.lock().unwrap().get_mut(host).unwrap() -= 1;
        }

        fn peak(&self, host: &str) -> usize {
            self.peak.lock().unwrap().get(host).copied().unwrap_or(0)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_per_host_cap_holds() {
        let pool = Arc::new(WorkerPool::new("download", 8).unwrap());
        let gate = Arc::new(HostGate::new(2, pool));
        let barrier = LevelBarrier::new();
        let tracker = Arc::new(Tracker::default());
        let completed = Arc::new(AtomicUsize::new(0));

        let standing = barrier.register();
        for i in 0..24 {
            let host = if i % 2 == 0 { "a.test" } else { "b.test" };
            let unit = barrier.register();
            let tracker = Arc::clone(&tracker);
            let completed = Arc::clone(&completed);
            gate.schedule(host, async move {
                let _unit = unit;
                tracker.enter(host);
                tokio::time::sleep(Duration::from_millis(5)).await;
                tracker.leave(host);
                completed.fetch_add(1, Ordering::SeqCst);
            });
        }
        barrier.await_level_done(standing).await;

        assert_eq!(completed.load(Ordering::SeqCst), 24);
        assert!(tracker.peak("a.test") <= 2);
        assert!(tracker.peak("b.test") <= 2);
        assert_eq!(gate.in_flight("a.test"), 0);
        assert_eq!(gate.pending("b.test"), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_slot_is_fifo() {
        let pool = Arc::new(WorkerPool::new("download", 4).unwrap());
        let gate = Arc::new(HostGate::new(1, pool));
        let barrier = LevelBarrier::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let standing = barrier.register();
        for i in 0..10 {
            let unit = barrier.register();
            let order = Arc::clone(&order);
            gate.schedule("a.test", async move {
                let _unit = unit;
                tokio::time::sleep(Duration::from_millis(1)).await;
                order.lock().unwrap().push(i);
            });
        }
        barrier.await_level_done(standing).await;

        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_queues_beyond_capacity() {
        let pool = Arc::new(WorkerPool::new("download", 1).unwrap());
        let gate = Arc::new(HostGate::new(1, pool));
        let barrier = LevelBarrier::new();

        let standing = barrier.register();
        for _ in 0..3 {
            let unit = barrier.register();
            gate.schedule("a.test", async move {
                let _unit = unit;
            });
        }
        // Nothing has run yet on the current-thread runtime.
        assert_eq!(gate.in_flight("a.test"), 1);
        assert_eq!(gate.pending("a.test"), 2);

        barrier.await_level_done(standing).await;
        assert_eq!(gate.in_flight("a.test"), 0);
        assert_eq!(gate.pending("a.test"), 0);
    }

    #[cfg(debug_assertions)]
    #[tokio::test]
    #[should_panic(expected = "host capacity must be > 0")]
    async fn test_zero_capacity_is_rejected() {
        let pool = Arc::new(WorkerPool::new("download", 1).unwrap());
        let _gate = HostGate::new(0, pool);
    }

    #[tokio::test]
    async fn test_closed_pool_releases_everything() {
        let pool = Arc::new(WorkerPool::new("download", 1).unwrap());
        let gate = Arc::new(HostGate::new(1, Arc::clone(&pool)));
        let barrier = LevelBarrier::new();
        pool.close();

        let standing = barrier.register();
        for _ in 0..3 {
            let unit = barrier.register();
            gate.schedule("a.test", async move {
                let _unit = unit;
            });
        }
        tokio::time::timeout(Duration::from_secs(1), barrier.await_level_done(standing))
            .await
            .expect("rejected tasks must not leak barrier units");
        assert_eq!(gate.in_flight("a.test"), 0);
    }
}
