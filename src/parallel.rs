//! Fixed-size worker pool with cooperative cancellation.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::{FvError, Result};

/// Shared flag checked by workers before each unit of work.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A rayon pool, either owned with a fixed thread count or rayon's global one.
pub struct WorkerPool {
    pool: Option<ThreadPool>,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("fandv-worker-{i}"))
            .build()
            .map_err(|e| FvError::ThreadPool(e.to_string()))?;
        Ok(Self { pool: Some(pool) })
    }

    pub fn global() -> Self {
        Self { pool: None }
    }

    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Run `op` inside this pool.
    pub fn install<T: Send>(&self, op: impl FnOnce() -> T + Send) -> T {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Split [0, len) into ranges of at most `chunk` and evaluate `f` on each.
    ///
    /// Results come back in range order. A range that starts after `cancel`
    /// has fired is skipped and the whole call fails with `Cancelled`.
    pub fn map_ranges<T, F>(
        &self,
        len: usize,
        chunk: usize,
        cancel: &CancelToken,
        f: F,
    ) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(Range<usize>) -> Result<T> + Sync,
    {
        let chunk = chunk.max(1);
        let ranges: Vec<Range<usize>> = (0..len)
            .step_by(chunk)
            .map(|start| start..(start + chunk).min(len))
            .collect();
        debug!(ranges = ranges.len(), threads = self.threads(), "dispatching");
        self.install(|| {
            ranges
                .into_par_iter()
                .map(|range| {
                    if cancel.is_cancelled() {
                        return Err(FvError::Cancelled);
                    }
                    f(range)
                })
                .collect()
        })
    }

    /// Chunk size that gives every worker a few ranges.
    pub fn chunk_for(&self, len: usize) -> usize {
        len.div_ceil(self.threads() * 4).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_cover_in_order() {
        let pool = WorkerPool::new(3).unwrap();
        let out = pool
            .map_ranges(10, 3, &CancelToken::new(), |r| Ok(r.collect::<Vec<_>>()))
            .unwrap();
        assert_eq!(out, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8], vec![9]]);
        assert_eq!(pool.threads(), 3);
    }

    #[test]
    fn test_empty_len() {
        let pool = WorkerPool::global();
        let out = pool
            .map_ranges(0, 4, &CancelToken::new(), |r| Ok(r.len()))
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_cancelled_before_start() {
        let pool = WorkerPool::new(2).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let res = pool.map_ranges(8, 2, &cancel, |r| Ok(r.len()));
        assert!(matches!(res, Err(FvError::Cancelled)));
    }

    #[test]
    fn test_cancel_from_worker() {
        let pool = WorkerPool::new(1).unwrap();
        let cancel = CancelToken::new();
        let res = pool.map_ranges(100, 1, &cancel, |r| {
            if r.start == 0 {
                cancel.cancel();
            }
            Ok(r.start)
        });
        assert!(matches!(res, Err(FvError::Cancelled)));
    }

    #[test]
    fn test_zero_threads_uses_default() {
        // rayon treats 0 as "pick automatically"
        assert!(WorkerPool::new(0).unwrap().threads() >= 1);
    }
}
