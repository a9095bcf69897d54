/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::ops::Range;

/// A read-only, per-worker shard of a partitioned graph.
///
/// A fragment exposes *inner* vertices (owned by this worker) and *outer*
/// vertices (ghost copies of vertices owned elsewhere but adjacent to inner
/// vertices). Vertices are identified by an opaque local index, stable for
/// the fragment's lifetime, with all inner vertices laid out before all outer
/// vertices:
///
/// ```text
/// 0 .. num_inner()              inner (owned) vertices
/// num_inner() .. num_local()    outer (ghost) vertices
/// ```
///
/// Each vertex additionally carries a globally unique 64-bit identifier,
/// translated in both directions by [`global_id`](Fragment::global_id) and
/// [`local_by_global`](Fragment::local_by_global).
///
/// Adjacency is exposed as lazy, restartable sequences of
/// `(neighbor, weight)` pairs. Arcs are materialized in every fragment owning
/// one of their endpoints, so an outer vertex sees exactly the arcs that
/// connect it to this fragment's inner vertices.
pub trait Fragment: Sync {
    /// The type of the lazy sequences returned by
    /// [`outgoing`](Fragment::outgoing) and [`incoming`](Fragment::incoming).
    type Arcs<'a>: IntoIterator<Item = (usize, f64)>
    where
        Self: 'a;

    /// Returns the identifier of this fragment, which is also the rank of the
    /// worker owning it.
    fn fragment_id(&self) -> usize;

    /// Returns the number of vertices of the whole graph, constant for the
    /// fragment's lifetime.
    fn num_total(&self) -> usize;

    /// Returns the number of inner vertices of this fragment.
    fn num_inner(&self) -> usize;

    /// Returns the number of local vertices of this fragment, inner and outer.
    fn num_local(&self) -> usize;

    /// Returns the range of inner vertex handles.
    #[inline(always)]
    fn inner_vertices(&self) -> Range<usize> {
        0..self.num_inner()
    }

    /// Returns the range of outer (ghost) vertex handles.
    #[inline(always)]
    fn outer_vertices(&self) -> Range<usize> {
        self.num_inner()..self.num_local()
    }

    /// Returns whether `v` is an inner vertex.
    #[inline(always)]
    fn is_inner(&self, v: usize) -> bool {
        v < self.num_inner()
    }

    /// Returns the arcs leaving `v`, as `(neighbor, weight)` pairs.
    fn outgoing(&self, v: usize) -> Self::Arcs<'_>;

    /// Returns the arcs entering `v`, as `(neighbor, weight)` pairs.
    fn incoming(&self, v: usize) -> Self::Arcs<'_>;

    /// Returns the global identifier of local vertex `v`.
    fn global_id(&self, v: usize) -> u64;

    /// Returns the local handle of the vertex with global identifier `gid`,
    /// or [`None`] if this fragment holds no copy of it.
    fn local_by_global(&self, gid: u64) -> Option<usize>;

    /// Returns the rank of the worker owning vertex `v` (for inner vertices,
    /// this fragment's own id).
    fn owner_rank(&self, v: usize) -> usize;
}
