/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Weakly connected components by minimum-label propagation.
//!
//! Every vertex starts with its own global id as component identifier; ids
//! then propagate along arcs, each vertex keeping the unsigned minimum it has
//! seen, until a global fixpoint is reached. At convergence the identifier of
//! every vertex is the minimum global id of its component.
//!
//! # Requirements
//!
//! The fragments must hold a *symmetric* graph: labels propagate along arc
//! direction, so weak (undirected) connectivity requires every arc to be
//! present in both orientations. No symmetry check is performed.
//!
//! # Adaptive propagation
//!
//! Each round chooses between two observationally equivalent strategies from
//! the fraction of vertices whose identifier changed in the previous round:
//!
//! - **pull** (dense rounds): every vertex scans its incoming neighbors and
//!   takes the minimum; read-heavy and write-light, it amortizes well when
//!   many vertices are active and avoids redundant outbound messages;
//! - **push** (sparse rounds): every *active* vertex lowers the identifier of
//!   its outgoing neighbors through an atomic fetch-minimum; write-heavy, but
//!   it only touches the vertices that actually changed.
//!
//! The switchover threshold is a performance knob, not a correctness
//! parameter; [`Strategy`] can also pin one of the two paths.
//!
//! # Examples
//!
//! Two disjoint (symmetric) triangles:
//!
//! ```
//! use bspgraph::prelude::*;
//! use bspgraph_algo::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut arcs = vec![(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)];
//! arcs.extend(arcs.clone().into_iter().map(|(u, v)| (v, u)));
//! let fragments = VecFragment::partition(6, &arcs, 1);
//! let programs: Vec<_> = fragments.iter().map(Wcc::new).collect();
//! let mut programs = run_local(&fragments, programs, 2)?;
//!
//! let wcc = programs.pop().unwrap();
//! assert_eq!(wcc.components(), vec![0, 0, 0, 3, 3, 3]);
//! # Ok(())
//! # }
//! ```

use super::label_store::LabelStore;
use bspgraph::active_set::ActiveSet;
use bspgraph::engine::ParallelEngine;
use bspgraph::error::ComputeError;
use bspgraph::traits::{AllReduce, Fragment, MessageManager, VertexProgram};

/// Selects the propagation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Chooses per round: pull when the active fraction exceeds the
    /// threshold, push otherwise. This is the default.
    #[default]
    Adaptive,
    /// Always pushes.
    Push,
    /// Always pulls.
    Pull,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Adaptive => f.write_str("adaptive"),
            Strategy::Push => f.write_str("push"),
            Strategy::Pull => f.write_str("pull"),
        }
    }
}

/// Minimum-label propagation with adaptive push/pull over one fragment.
pub struct Wcc {
    strategy: Strategy,
    /// Active fraction above which an adaptive round pulls.
    threshold: f64,
    labels: LabelStore,
    /// Vertices whose identifier changed in the previous round.
    curr: ActiveSet,
    /// Vertices whose identifier changed in this round.
    next: ActiveSet,
}

impl Wcc {
    /// Creates a components computation over one fragment, with the adaptive
    /// strategy and an activity threshold of 0.1.
    pub fn new(frag: &impl Fragment) -> Self {
        let n = frag.num_local();
        Self {
            strategy: Strategy::default(),
            threshold: 0.1,
            labels: LabelStore::new(n),
            curr: ActiveSet::new(n),
            next: ActiveSet::new(n),
        }
    }

    /// Sets the propagation [`Strategy`].
    pub fn strategy(&mut self, strategy: Strategy) -> &mut Self {
        self.strategy = strategy;
        self
    }

    /// Sets the active fraction above which an adaptive round pulls.
    ///
    /// Any threshold in [0 . . 1] preserves the result; only performance
    /// changes.
    ///
    /// # Panics
    ///
    /// Panics if `threshold` is not in the interval [0 . . 1].
    pub fn activity_threshold(&mut self, threshold: f64) -> &mut Self {
        assert!(
            (0.0..=1.0).contains(&threshold),
            "The activity threshold must be in [0 . . 1], got {threshold}"
        );
        self.threshold = threshold;
        self
    }

    /// Returns the component identifier of local vertex `v`.
    pub fn component(&self, v: usize) -> u64 {
        self.labels.get(v)
    }

    /// Returns the per-vertex component identifiers of this fragment.
    ///
    /// At convergence the entries of inner vertices hold the minimum global
    /// id of their component.
    pub fn components(&self) -> Vec<u64> {
        (0..self.curr.capacity()).map(|v| self.labels.get(v)).collect()
    }

    /// One pull round: every vertex of the fragment takes the unsigned
    /// minimum of its incoming neighbors' identifiers; outer vertices that
    /// got lowered additionally sync the new identifier to their owner.
    fn pull_round<F: Fragment, M: MessageManager<u64>>(
        &self,
        frag: &F,
        engine: &ParallelEngine,
        messages: &M,
    ) {
        let labels = &self.labels;
        let next = &self.next;
        engine.for_each_vertex(frag.inner_vertices(), |v| {
            let old = labels.get(v);
            let mut new = old;
            for (u, _) in frag.incoming(v) {
                let label = labels.get(u);
                if label < new {
                    new = label;
                }
            }
            if new < old {
                // Racy reads of neighbor labels are benign: labels only
                // decrease, and a missed update is caught in a later round.
                labels.set(v, new);
                next.insert(v);
            }
        });
        engine.for_each_vertex(frag.outer_vertices(), |v| {
            let old = labels.get(v);
            let mut new = old;
            for (u, _) in frag.incoming(v) {
                let label = labels.get(u);
                if label < new {
                    new = label;
                }
            }
            if new < old {
                labels.set(v, new);
                next.insert(v);
                messages.sync_to_owner(v, new);
            }
        });
    }

    /// One push round: every active inner vertex lowers the identifiers of
    /// its outgoing neighbors; active outer vertices then sync their
    /// identifier to their owner.
    fn push_round<F: Fragment, M: MessageManager<u64>>(
        &self,
        frag: &F,
        engine: &ParallelEngine,
        messages: &M,
    ) {
        let labels = &self.labels;
        let next = &self.next;
        engine.for_each_in_set(frag.inner_vertices(), &self.curr, |v| {
            let cid = labels.get(v);
            for (u, _) in frag.outgoing(v) {
                // The neighbor may be lowered concurrently by any thread, so
                // the update must be an atomic fetch-minimum.
                if labels.get(u) > cid && labels.fetch_min(u, cid) > cid {
                    next.insert(u);
                }
            }
        });
        engine.for_each_in_set(frag.outer_vertices(), &self.next, |v| {
            messages.sync_to_owner(v, labels.get(v));
        });
    }
}

impl<F: Fragment> VertexProgram<F> for Wcc {
    type Msg = u64;

    fn initial_round<M, R>(
        &mut self,
        frag: &F,
        engine: &ParallelEngine,
        messages: &mut M,
        _reducer: &R,
    ) -> Result<(), ComputeError>
    where
        M: MessageManager<Self::Msg>,
        R: AllReduce,
    {
        log::info!("Strategy: {}", self.strategy);
        log::info!("Activity threshold: {}", self.threshold);

        // Seed every local copy, ghosts included, with its own global id, so
        // neighbor comparisons are meaningful before any message arrives.
        {
            let labels = &self.labels;
            engine.for_each_vertex(0..frag.num_local(), |v| {
                labels.set(v, frag.global_id(v));
            });
        }

        self.pull_round(frag, engine, &*messages);

        if !self.next.is_clear_in(frag.inner_vertices()) {
            messages.force_continue();
        }
        std::mem::swap(&mut self.curr, &mut self.next);
        Ok(())
    }

    fn incremental_round<M, R>(
        &mut self,
        frag: &F,
        engine: &ParallelEngine,
        messages: &mut M,
        _reducer: &R,
    ) -> Result<(), ComputeError>
    where
        M: MessageManager<Self::Msg>,
        R: AllReduce,
    {
        self.next.clear();

        // Received identifiers lower the inner copies and reactivate them.
        {
            let labels = &self.labels;
            let curr = &self.curr;
            messages.drain(|v, cid| {
                if cid < labels.get(v) {
                    labels.fetch_min(v, cid);
                    curr.insert(v);
                }
            })?;
        }

        let rate = self.curr.len() as f64 / frag.num_inner().max(1) as f64;
        let pull = match self.strategy {
            Strategy::Adaptive => rate > self.threshold,
            Strategy::Pull => true,
            Strategy::Push => false,
        };
        log::debug!(
            "Active rate {:.3}, using {}",
            rate,
            if pull { "pull" } else { "push" }
        );
        if pull {
            self.pull_round(frag, engine, &*messages);
        } else {
            self.push_round(frag, engine, &*messages);
        }

        if !self.next.is_clear_in(frag.inner_vertices()) {
            messages.force_continue();
        }
        std::mem::swap(&mut self.curr, &mut self.next);
        Ok(())
    }
}
