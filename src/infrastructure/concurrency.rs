//! Thread pool setup for rendering several grammars at once.
//! Every file gets its own translator, so the pool size never changes output.

use anyhow::Result;

/// Default worker count: half the cores, at least one.
pub fn default_workers() -> usize {
    std::cmp::max(1, num_cpus::get() / 2)
}

/// Initialize the global rayon thread pool. `threads` overrides the default
/// worker count. Returns the number of workers.
pub fn init_thread_pool(threads: Option<usize>) -> Result<usize> {
    let workers = threads.filter(|&n| n > 0).unwrap_or_else(default_workers);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()?;

    tracing::debug!(workers, cores = num_cpus::get(), "initialized thread pool");

    Ok(workers)
}
