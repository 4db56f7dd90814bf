//! Concurrency primitives shared by the crawl driver.
//!
//! - [`WorkerPool`]: fixed-size pool bounding global concurrency
//! - [`HostGate`]: per-host FIFO admission in front of the download pool
//! - [`LevelBarrier`]: completion tracking for one BFS level

mod barrier;
mod host_gate;
mod pool;

pub use barrier::{LevelBarrier, LevelUnit};
pub use host_gate::HostGate;
pub use pool::{Job, WorkerPool};
