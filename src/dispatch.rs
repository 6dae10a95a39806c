//! Parallel dispatch of per-element work.
//!
//! Elements are fully independent, and in every output layout the element index is the
//! outermost axis. An [`ElementExecutor`] therefore only needs to hand out disjoint chunks of
//! the output buffer, one per batch of elements, and run the unit of work once for each.
use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;

/// Backend for running per-element work.
pub trait ElementExecutor: Sync {
    /// Invokes `f(first_element, chunk)` exactly once for every batch of elements.
    ///
    /// The output is split into consecutive chunks of `batch_size * element_len` entries (the
    /// last chunk may be shorter). `first_element` is the index of the first element in the
    /// batch. No ordering between batches is guaranteed.
    fn for_each_element_batch<T, F>(&self, output: &mut [T], element_len: usize, batch_size: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync;
}

/// Runs all batches in order on the calling thread.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SerialExecutor;

/// Runs batches in parallel on the current rayon thread pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayonExecutor {
    min_batches_per_task: usize,
}

impl Default for RayonExecutor {
    fn default() -> Self {
        Self {
            min_batches_per_task: 8,
        }
    }
}

impl RayonExecutor {
    /// Sets the minimum number of batches processed by a single rayon task.
    pub fn with_min_batches_per_task(self, min_batches_per_task: usize) -> Self {
        Self {
            min_batches_per_task: min_batches_per_task.max(1),
        }
    }

    pub fn min_batches_per_task(&self) -> usize {
        self.min_batches_per_task
    }
}

fn chunk_len(output_len: usize, element_len: usize, batch_size: usize) -> Option<usize> {
    debug_assert!(batch_size > 0, "batch size must be positive");
    debug_assert_eq!(output_len % element_len.max(1), 0, "output must consist of whole elements");
    if output_len == 0 || element_len == 0 {
        None
    } else {
        Some(element_len * batch_size.max(1))
    }
}

impl ElementExecutor for SerialExecutor {
    fn for_each_element_batch<T, F>(&self, output: &mut [T], element_len: usize, batch_size: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync,
    {
        if let Some(chunk_len) = chunk_len(output.len(), element_len, batch_size) {
            let batch_size = chunk_len / element_len;
            for (batch_idx, chunk) in output.chunks_mut(chunk_len).enumerate() {
                f(batch_idx * batch_size, chunk);
            }
        }
    }
}

impl ElementExecutor for RayonExecutor {
    fn for_each_element_batch<T, F>(&self, output: &mut [T], element_len: usize, batch_size: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync,
    {
        if let Some(chunk_len) = chunk_len(output.len(), element_len, batch_size) {
            let batch_size = chunk_len / element_len;
            output
                .par_chunks_mut(chunk_len)
                .with_min_len(self.min_batches_per_task)
                .enumerate()
                .for_each(|(batch_idx, chunk)| f(batch_idx * batch_size, chunk));
        }
    }
}

/// Number of elements processed together in one batch by the 2D kernels.
///
/// Small quadrature grids give little work per element, so several elements share one batch
/// (and one set of scratch buffers). The result never affects the computed values.
pub fn default_batch_size_2d(q1d: usize) -> usize {
    match q1d {
        0..=2 => 16,
        3..=4 => 8,
        5..=6 => 4,
        7..=8 => 2,
        _ => 1,
    }
}
