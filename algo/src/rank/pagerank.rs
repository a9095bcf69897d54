/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Fragment-parallel PageRank.
//!
//! A [vertex program](VertexProgram) computing PageRank with damping factor α
//! over a fixed number of iterations, with the mass of dangling vertices
//! redistributed uniformly.
//!
//! # The round structure
//!
//! During the computation the rank array holds *outdegree-divided* values:
//! the value stored at a non-dangling vertex is its rank divided by its
//! outdegree, which is exactly the per-arc contribution its successors need.
//! The initial round stores 1/(*n*·*d*) at every vertex of outdegree *d* (or
//! 1/*n* at a dangling vertex) and sends the stored value along outgoing
//! edges, so that every fragment holding a ghost copy of the vertex sees it.
//!
//! Each incremental round then computes
//!
//! > base = (1 − α)/*n* + α·*s*/*n*
//!
//! where *s* is the global dangling mass obtained by reduction at the end of
//! the previous round, overwrites ghost ranks with the received values, and
//! for every inner vertex stores into the next-rank buffer either `base` (if
//! dangling) or
//!
//! > (α·∑ incoming divided ranks + base) / outdegree,
//!
//! emitting the stored value along outgoing edges. The buffers are then
//! copied at a single synchronization point, and the new dangling mass
//! (base times the number of local dangling vertices) is reduced with all
//! workers.
//!
//! When the round counter exceeds the configured number of iterations, a
//! final pass multiplies every non-dangling rank by its outdegree, undoing
//! the division, and the program stops signaling continuation.
//!
//! # Examples
//!
//! A 4-cycle converges to the uniform rank:
//!
//! ```
//! use bspgraph::prelude::*;
//! use bspgraph_algo::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let fragments = VecFragment::partition(4, &[(0, 1), (1, 2), (2, 3), (3, 0)], 1);
//! let programs: Vec<_> = fragments.iter().map(PageRank::new).collect();
//! let mut programs = run_local(&fragments, programs, 2)?;
//!
//! let pr = programs.pop().unwrap();
//! for v in 0..4 {
//!     assert!((pr.ranks()[v] - 0.25).abs() < 1E-4);
//! }
//! # Ok(())
//! # }
//! ```

use bspgraph::engine::ParallelEngine;
use bspgraph::error::ComputeError;
use bspgraph::traits::{AllReduce, Fragment, MessageManager, VertexProgram};
use kahan::KahanSum;
use std::sync::atomic::{AtomicU64, Ordering};
use sync_cell_slice::SyncSlice;

/// Rank propagation with uniform redistribution of dangling mass.
///
/// The struct is configured via setters, run by a driver such as
/// [`run_local`](bspgraph::runtime::run_local), and holds the per-vertex
/// state of one fragment; after the computation the rank of the inner
/// vertices is available through [`ranks`](Self::ranks).
#[derive(Debug)]
pub struct PageRank {
    alpha: f64,
    max_iterations: usize,
    superstep: usize,
    dangling_sum: f64,
    dangling_count: u64,
    /// Global outdegree of each inner vertex; entries of ghost vertices are
    /// never read.
    degree: Box<[u32]>,
    rank: Box<[f64]>,
    next_rank: Box<[f64]>,
}

impl PageRank {
    /// Creates a PageRank computation over one fragment, with α = 0.85 and
    /// 50 iterations.
    pub fn new(frag: &impl Fragment) -> Self {
        let n = frag.num_local();
        Self {
            alpha: 0.85,
            max_iterations: 50,
            superstep: 0,
            dangling_sum: 0.0,
            dangling_count: 0,
            degree: vec![0; n].into_boxed_slice(),
            rank: vec![0.0; n].into_boxed_slice(),
            next_rank: vec![0.0; n].into_boxed_slice(),
        }
    }

    /// Sets the damping factor α.
    ///
    /// # Panics
    ///
    /// Panics if `alpha` is not in the interval [0 . . 1).
    pub fn alpha(&mut self, alpha: f64) -> &mut Self {
        assert!(
            // Note that 0.0..1.0 is [0.0..1.0) in mathematical notation
            (0.0..1.0).contains(&alpha),
            "The damping factor must be in [0 . . 1), got {alpha}"
        );
        self.alpha = alpha;
        self
    }

    /// Sets the number of iterations.
    pub fn max_iterations(&mut self, max_iterations: usize) -> &mut Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Returns the per-vertex ranks of this fragment.
    ///
    /// Only the entries of inner vertices are meaningful; ghost entries hold
    /// stale divided values.
    pub fn ranks(&self) -> &[f64] {
        &self.rank
    }

    /// Returns the number of incremental rounds performed so far.
    pub fn superstep(&self) -> usize {
        self.superstep
    }

    /// Returns the number of dangling vertices of this fragment.
    pub fn dangling_count(&self) -> u64 {
        self.dangling_count
    }

    /// Returns the global dangling mass obtained by the last reduction.
    pub fn dangling_sum(&self) -> f64 {
        self.dangling_sum
    }
}

impl<F: Fragment> VertexProgram<F> for PageRank {
    type Msg = f64;

    fn initial_round<M, R>(
        &mut self,
        frag: &F,
        engine: &ParallelEngine,
        messages: &mut M,
        reducer: &R,
    ) -> Result<(), ComputeError>
    where
        M: MessageManager<Self::Msg>,
        R: AllReduce,
    {
        let n = frag.num_total();
        if n == 0 {
            return Err(ComputeError::InvalidGraph(
                "the graph has no vertices".into(),
            ));
        }
        log::info!("Alpha: {}", self.alpha);
        log::info!("Iterations: {}", self.max_iterations);

        self.superstep = 0;
        let base = 1.0 / n as f64;

        // Sentinel for an outdegree that does not fit the degree counter.
        let overflow = AtomicU64::new(u64::MAX);
        {
            let degree = self.degree.as_sync_slice();
            let rank = self.rank.as_sync_slice();
            let messages = &*messages;
            engine.for_each_vertex(frag.inner_vertices(), |v| {
                let d = frag.outgoing(v).into_iter().count();
                if d > u32::MAX as usize {
                    overflow.store(frag.global_id(v), Ordering::Relaxed);
                    return;
                }
                // SAFETY: each vertex is written by exactly one thread.
                unsafe {
                    degree[v].set(d as u32);
                    if d == 0 {
                        rank[v].set(base);
                    } else {
                        let divided = base / d as f64;
                        rank[v].set(divided);
                        messages.send_along_outgoing_edges(v, divided);
                    }
                }
            });
        }
        let overflow = overflow.load(Ordering::Relaxed);
        if overflow != u64::MAX {
            return Err(ComputeError::InvalidGraph(format!(
                "the outdegree of vertex {} overflows the degree counter",
                overflow
            )));
        }

        self.dangling_count = frag
            .inner_vertices()
            .filter(|&v| self.degree[v] == 0)
            .count() as u64;
        self.dangling_sum = reducer.all_reduce_sum(base * self.dangling_count as f64)?;
        log::info!(
            "{} dangling vertices, initial dangling mass {}",
            self.dangling_count,
            self.dangling_sum
        );

        // The next round must run even with no messages in flight: the
        // dangling mass has to be redistributed.
        messages.force_continue();
        Ok(())
    }

    fn incremental_round<M, R>(
        &mut self,
        frag: &F,
        engine: &ParallelEngine,
        messages: &mut M,
        reducer: &R,
    ) -> Result<(), ComputeError>
    where
        M: MessageManager<Self::Msg>,
        R: AllReduce,
    {
        self.superstep += 1;
        if self.superstep > self.max_iterations {
            // Undo the per-arc division; dangling vertices already hold
            // their full rank. Not signaling continuation releases the
            // computation.
            let degree = &self.degree;
            let rank = self.rank.as_sync_slice();
            engine.for_each_vertex(frag.inner_vertices(), |v| {
                if degree[v] != 0 {
                    // SAFETY: each vertex is written by exactly one thread.
                    unsafe { rank[v].set(rank[v].get() * degree[v] as f64) };
                }
            });
            return Ok(());
        }

        let n = frag.num_total() as f64;
        let base = (1.0 - self.alpha) / n + self.alpha * self.dangling_sum / n;

        // Overwrite ghost ranks with the values received from their owners;
        // at most one message per ghost per round, so last-writer-wins is
        // deterministic.
        {
            let rank = &mut self.rank;
            messages.drain(|v, value| rank[v] = value)?;
        }

        {
            let alpha = self.alpha;
            let degree = &self.degree;
            let rank = &self.rank;
            let next_rank = self.next_rank.as_sync_slice();
            let messages = &*messages;
            engine.for_each_vertex(frag.inner_vertices(), |v| {
                let new_rank = if degree[v] == 0 {
                    base
                } else {
                    let mut sigma: KahanSum<f64> = KahanSum::new();
                    for (u, _) in frag.incoming(v) {
                        sigma += rank[u];
                    }
                    let new_rank = (sigma.sum() * alpha + base) / degree[v] as f64;
                    messages.send_along_outgoing_edges(v, new_rank);
                    new_rank
                };
                // SAFETY: each vertex is written by exactly one thread.
                unsafe { next_rank[v].set(new_rank) };
            });
        }

        // Publish the next buffer; ghost entries are left to the drain of
        // the next round.
        {
            let next_rank = &self.next_rank;
            let rank = self.rank.as_sync_slice();
            engine.for_each_vertex(frag.inner_vertices(), |v| {
                // SAFETY: each vertex is written by exactly one thread.
                unsafe { rank[v].set(next_rank[v]) };
            });
        }

        self.dangling_sum = reducer.all_reduce_sum(base * self.dangling_count as f64)?;
        messages.force_continue();
        Ok(())
    }
}
