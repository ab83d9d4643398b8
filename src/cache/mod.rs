mod batch;
mod pass_cache;

pub use batch::{BatchReport, BatchScheduler, UpdateTask, DEFAULT_BATCH_SIZE};
pub use pass_cache::{cache_window, CachedPasses, PassCache, UpdateToken};
