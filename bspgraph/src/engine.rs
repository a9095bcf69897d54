/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The per-worker parallel engine.
//!
//! Within one worker, the vertex-processing phase of a superstep is
//! parallelized across a fixed-size thread pool: threads grab contiguous
//! chunks of the vertex range from an atomic cursor and process the vertices
//! of a chunk sequentially. The engine methods do not return until every
//! thread has drained the cursor, so they double as the superstep's join
//! barrier.
//!
//! The engine is acquired once per computation and released (dropped) when
//! the computation reaches its terminal state.

use crate::active_set::ActiveSet;
use anyhow::{Context, Result};
use rayon::ThreadPool;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::utils::Granularity;

/// A fixed-size worker pool running per-vertex closures in parallel chunks.
pub struct ParallelEngine {
    thread_pool: ThreadPool,
    granularity: usize,
}

impl ParallelEngine {
    /// Creates an engine with the given number of threads and the default
    /// [`Granularity`].
    ///
    /// Passing zero threads uses one thread per available CPU.
    pub fn new(num_threads: usize) -> Result<Self> {
        Self::with_granularity(num_threads, Granularity::default(), 0, None)
    }

    /// Creates an engine with the given number of threads and chunk
    /// granularity.
    ///
    /// The granularity is resolved once against the size of the vertex range
    /// this engine will iterate over; `num_arcs` is only needed to resolve an
    /// arc-based granularity (see [`Granularity::vertex_granularity`]).
    pub fn with_granularity(
        num_threads: usize,
        granularity: Granularity,
        num_vertices: usize,
        num_arcs: Option<u64>,
    ) -> Result<Self> {
        let num_threads = if num_threads == 0 {
            num_cpus::get()
        } else {
            num_threads
        };
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .context("Could not create thread pool")?;
        let granularity = granularity.vertex_granularity(num_vertices, num_arcs);
        Ok(Self {
            thread_pool,
            granularity,
        })
    }

    /// Returns the number of threads of this engine.
    pub fn num_threads(&self) -> usize {
        self.thread_pool.current_num_threads()
    }

    /// Runs `f` on every vertex of `range`, in parallel chunks.
    ///
    /// Returns after all threads have completed. An empty range is a no-op.
    pub fn for_each_vertex(&self, range: Range<usize>, f: impl Fn(usize) + Sync) {
        if range.is_empty() {
            return;
        }
        let cursor = AtomicUsize::new(range.start);
        let end = range.end;
        let granularity = self.granularity;
        self.thread_pool.broadcast(|_| loop {
            let start = cursor.fetch_add(granularity, Ordering::Relaxed);
            if start >= end {
                break;
            }
            for v in start..end.min(start + granularity) {
                f(v);
            }
        });
    }

    /// Runs `f` on every vertex of `range` that belongs to `set`, in
    /// parallel chunks.
    pub fn for_each_in_set(&self, range: Range<usize>, set: &ActiveSet, f: impl Fn(usize) + Sync) {
        if set.is_empty() {
            return;
        }
        self.for_each_vertex(range, |v| {
            if set.contains(v) {
                f(v);
            }
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn test_for_each_vertex_covers_range() -> Result<()> {
        let engine = ParallelEngine::with_granularity(4, Granularity::Vertices(7), 100, None)?;
        let sum = AtomicU64::new(0);
        engine.for_each_vertex(10..110, |v| {
            sum.fetch_add(v as u64, Ordering::Relaxed);
        });
        // Each vertex visited exactly once
        assert_eq!(sum.load(Ordering::Relaxed), (10..110u64).sum());
        Ok(())
    }

    #[test]
    fn test_for_each_vertex_empty_range() -> Result<()> {
        let engine = ParallelEngine::new(2)?;
        engine.for_each_vertex(5..5, |_| panic!("should not be called"));
        Ok(())
    }

    #[test]
    fn test_for_each_in_set() -> Result<()> {
        let engine = ParallelEngine::with_granularity(3, Granularity::Vertices(4), 50, None)?;
        let set = ActiveSet::new(50);
        set.insert(0);
        set.insert(13);
        set.insert(49);
        let visited = AtomicU64::new(0);
        engine.for_each_in_set(0..50, &set, |v| {
            visited.fetch_add(1 << (v % 60), Ordering::Relaxed);
        });
        assert_eq!(visited.load(Ordering::Relaxed), (1 << 0) | (1 << 13) | (1 << 49));
        Ok(())
    }
}
