/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Active-vertex sets.
//!
//! An [`ActiveSet`] is a concurrent boolean membership set over the local
//! vertex index space of a fragment, used to restrict parallel work to the
//! vertices whose state changed in the previous round. A computation keeps
//! two of them — the set being consumed and the set being accumulated — and
//! swaps them with [`std::mem::swap`] at a single, clearly delimited
//! synchronization point per round; the swapped-out set is cleared at the
//! start of the next round.

use crossbeam_utils::CachePadded;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use sux::bits::AtomicBitVec;

/// A concurrent membership set over a fixed vertex index space.
///
/// Insertions may race from any engine thread; cardinality is tracked
/// alongside the bits, so [`len`](ActiveSet::len) is O(1). Clearing requires
/// exclusive access, which the round structure provides for free.
pub struct ActiveSet {
    bits: AtomicBitVec,
    count: CachePadded<AtomicUsize>,
    num_bits: usize,
}

impl ActiveSet {
    /// Creates an empty set over the index space `0..n`.
    pub fn new(n: usize) -> Self {
        Self {
            bits: AtomicBitVec::new(n),
            count: CachePadded::new(AtomicUsize::new(0)),
            num_bits: n,
        }
    }

    /// Returns the size of the index space.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.num_bits
    }

    /// Returns the number of vertices currently in the set.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Returns whether the set is empty.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts `v`, returning whether it was not already present.
    ///
    /// May be called concurrently from multiple threads; concurrent inserts
    /// of the same vertex count it exactly once.
    #[inline(always)]
    pub fn insert(&self, v: usize) -> bool {
        if !self.bits.swap(v, true, Ordering::Relaxed) {
            self.count.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Returns whether `v` is in the set.
    #[inline(always)]
    pub fn contains(&self, v: usize) -> bool {
        self.bits.get(v, Ordering::Relaxed)
    }

    /// Removes every vertex from the set.
    pub fn clear(&mut self) {
        self.bits.fill(false, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }

    /// Returns whether no vertex of `range` is in the set.
    ///
    /// This is the per-round quiescence query: a worker signals continuation
    /// exactly when the inner range of the accumulating set is nonempty.
    pub fn is_clear_in(&self, range: Range<usize>) -> bool {
        if self.is_empty() {
            return true;
        }
        range.into_iter().all(|v| !self.contains(v))
    }
}
