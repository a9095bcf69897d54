/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! An in-memory [`Fragment`] implementation based on vectors of arcs.

use crate::traits::Fragment;
use std::collections::{BTreeSet, HashMap};

/// A mutable in-memory fragment with adjacency stored as vectors of weighted
/// arcs.
///
/// Fragments are produced by [`partition`](VecFragment::partition), which
/// splits a global arc list among `num_workers` fragments by assigning vertex
/// `g` to worker `g % num_workers`. Every arc is materialized in each
/// fragment owning one of its endpoints; endpoints not owned by a fragment
/// become ghost (outer) vertices there, so an outer vertex sees exactly the
/// arcs connecting it to the fragment's inner vertices.
///
/// Inner vertices occupy local indices `0..num_inner()` in increasing global
/// order, followed by the ghosts, also in increasing global order.
#[derive(Debug, Clone)]
pub struct VecFragment {
    fragment_id: usize,
    num_workers: usize,
    num_total: usize,
    num_inner: usize,
    /// Local index to global id.
    gids: Box<[u64]>,
    /// Global id to local index, for the vertices this fragment has a copy of.
    locals: HashMap<u64, usize>,
    /// For each local vertex, its outgoing arcs as (local target, weight).
    out: Vec<Vec<(usize, f64)>>,
    /// For each local vertex, its incoming arcs as (local source, weight).
    inc: Vec<Vec<(usize, f64)>>,
    num_arcs: u64,
}

impl VecFragment {
    /// Partitions a graph given as a global arc list into one fragment per
    /// worker, with unit arc weights.
    ///
    /// # Panics
    ///
    /// Panics if `num_workers` is zero or if an arc endpoint is not smaller
    /// than `num_vertices`.
    pub fn partition(
        num_vertices: usize,
        arcs: &[(usize, usize)],
        num_workers: usize,
    ) -> Vec<VecFragment> {
        let weighted: Vec<_> = arcs.iter().map(|&(u, v)| (u, v, 1.0)).collect();
        Self::partition_weighted(num_vertices, &weighted, num_workers)
    }

    /// Partitions a graph given as a global weighted arc list into one
    /// fragment per worker.
    ///
    /// # Panics
    ///
    /// Panics if `num_workers` is zero or if an arc endpoint is not smaller
    /// than `num_vertices`.
    pub fn partition_weighted(
        num_vertices: usize,
        arcs: &[(usize, usize, f64)],
        num_workers: usize,
    ) -> Vec<VecFragment> {
        assert!(num_workers > 0, "Cannot partition among zero workers");
        for &(u, v, _) in arcs {
            let max = u.max(v);
            if max >= num_vertices {
                panic!(
                    "Vertex {} does not exist (the graph has {} vertices)",
                    max, num_vertices,
                );
            }
        }

        (0..num_workers)
            .map(|w| Self::build(num_vertices, arcs, num_workers, w))
            .collect()
    }

    fn build(
        num_vertices: usize,
        arcs: &[(usize, usize, f64)],
        num_workers: usize,
        fragment_id: usize,
    ) -> VecFragment {
        let owner = |g: usize| g % num_workers;

        // Ghosts: endpoints of local arcs owned elsewhere, in global order.
        let mut ghosts = BTreeSet::new();
        for &(u, v, _) in arcs {
            if owner(u) == fragment_id || owner(v) == fragment_id {
                if owner(u) != fragment_id {
                    ghosts.insert(u);
                }
                if owner(v) != fragment_id {
                    ghosts.insert(v);
                }
            }
        }

        let mut gids = Vec::new();
        let mut locals = HashMap::new();
        for g in (0..num_vertices).filter(|&g| owner(g) == fragment_id) {
            locals.insert(g as u64, gids.len());
            gids.push(g as u64);
        }
        let num_inner = gids.len();
        for &g in &ghosts {
            locals.insert(g as u64, gids.len());
            gids.push(g as u64);
        }

        let num_local = gids.len();
        let mut out = vec![Vec::new(); num_local];
        let mut inc = vec![Vec::new(); num_local];
        let mut num_arcs = 0;
        for &(u, v, weight) in arcs {
            if owner(u) == fragment_id || owner(v) == fragment_id {
                let lu = locals[&(u as u64)];
                let lv = locals[&(v as u64)];
                out[lu].push((lv, weight));
                inc[lv].push((lu, weight));
                num_arcs += 1;
            }
        }

        VecFragment {
            fragment_id,
            num_workers,
            num_total: num_vertices,
            num_inner,
            gids: gids.into_boxed_slice(),
            locals,
            out,
            inc,
            num_arcs,
        }
    }

    /// Returns the number of arcs materialized in this fragment.
    pub fn num_arcs(&self) -> u64 {
        self.num_arcs
    }

    /// Returns the number of fragments of the partition this fragment
    /// belongs to.
    pub fn num_fragments(&self) -> usize {
        self.num_workers
    }
}

impl Fragment for VecFragment {
    type Arcs<'a> = std::iter::Copied<std::slice::Iter<'a, (usize, f64)>>;

    #[inline(always)]
    fn fragment_id(&self) -> usize {
        self.fragment_id
    }

    #[inline(always)]
    fn num_total(&self) -> usize {
        self.num_total
    }

    #[inline(always)]
    fn num_inner(&self) -> usize {
        self.num_inner
    }

    #[inline(always)]
    fn num_local(&self) -> usize {
        self.gids.len()
    }

    #[inline(always)]
    fn outgoing(&self, v: usize) -> Self::Arcs<'_> {
        self.out[v].iter().copied()
    }

    #[inline(always)]
    fn incoming(&self, v: usize) -> Self::Arcs<'_> {
        self.inc[v].iter().copied()
    }

    #[inline(always)]
    fn global_id(&self, v: usize) -> u64 {
        self.gids[v]
    }

    #[inline(always)]
    fn local_by_global(&self, gid: u64) -> Option<usize> {
        self.locals.get(&gid).copied()
    }

    #[inline(always)]
    fn owner_rank(&self, v: usize) -> usize {
        (self.gids[v] % self.num_workers as u64) as usize
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_single_fragment_has_no_ghosts() {
        let frags = VecFragment::partition(4, &[(0, 1), (1, 2), (2, 3), (3, 0)], 1);
        assert_eq!(frags.len(), 1);
        let f = &frags[0];
        assert_eq!(f.num_inner(), 4);
        assert_eq!(f.num_local(), 4);
        assert_eq!(f.num_total(), 4);
        assert!(f.outer_vertices().is_empty());
        assert_eq!(f.outgoing(0).collect::<Vec<_>>(), vec![(1, 1.0)]);
        assert_eq!(f.incoming(0).collect::<Vec<_>>(), vec![(3, 1.0)]);
    }

    #[test]
    fn test_two_fragments_share_boundary_arcs() {
        // 0 -> 1 -> 2 -> 3 -> 0: with two workers, every arc crosses the cut.
        let arcs = [(0, 1), (1, 2), (2, 3), (3, 0)];
        let frags = VecFragment::partition(4, &arcs, 2);

        // Worker 0 owns {0, 2}, worker 1 owns {1, 3}.
        let f0 = &frags[0];
        assert_eq!(f0.num_inner(), 2);
        assert_eq!(f0.num_local(), 4);
        assert_eq!(f0.global_id(0), 0);
        assert_eq!(f0.global_id(1), 2);
        // Ghosts in global order after the inner vertices.
        assert_eq!(f0.global_id(2), 1);
        assert_eq!(f0.global_id(3), 3);
        assert!(f0.is_inner(1));
        assert!(!f0.is_inner(2));
        assert_eq!(f0.owner_rank(2), 1);

        // Inner vertex 0 has its full adjacency: out 0 -> 1, in 3 -> 0.
        let local_1 = f0.local_by_global(1).unwrap();
        let local_3 = f0.local_by_global(3).unwrap();
        assert_eq!(f0.outgoing(0).collect::<Vec<_>>(), vec![(local_1, 1.0)]);
        assert_eq!(f0.incoming(0).collect::<Vec<_>>(), vec![(local_3, 1.0)]);

        // The ghost of vertex 1 sees the arc from inner vertex 0.
        assert_eq!(f0.incoming(local_1).collect::<Vec<_>>(), vec![(0, 1.0)]);
    }

    #[test]
    fn test_isolated_vertices_are_inner_somewhere() {
        let frags = VecFragment::partition(5, &[], 3);
        let inner_total: usize = frags.iter().map(|f| f.num_inner()).sum();
        assert_eq!(inner_total, 5);
        for f in &frags {
            assert_eq!(f.num_local(), f.num_inner());
            for v in f.inner_vertices() {
                assert_eq!(f.local_by_global(f.global_id(v)), Some(v));
                assert_eq!(f.owner_rank(v), f.fragment_id());
            }
        }
    }

    #[test]
    #[should_panic(expected = "does not exist")]
    fn test_out_of_range_arc_panics() {
        VecFragment::partition(2, &[(0, 2)], 1);
    }
}
