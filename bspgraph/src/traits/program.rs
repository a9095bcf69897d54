/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::engine::ParallelEngine;
use crate::error::ComputeError;
use crate::traits::Fragment;

/// A fixed-width message payload.
///
/// Payloads travel between workers as 8-byte little-endian frames; the typed
/// envelope replaces runtime boxing with a statically chosen payload type per
/// algorithm (`f64` for rank values, `u64` for component labels — labels are
/// never narrowed to a floating-point representation, which would lose
/// precision above 2⁵³).
pub trait Payload: Copy + Send + 'static {
    /// Encodes this value as an 8-byte little-endian frame.
    fn encode(self) -> [u8; 8];

    /// Decodes a frame, returning [`None`] if its length is wrong.
    fn decode(frame: &[u8]) -> Option<Self>;
}

impl Payload for f64 {
    #[inline(always)]
    fn encode(self) -> [u8; 8] {
        self.to_le_bytes()
    }

    #[inline(always)]
    fn decode(frame: &[u8]) -> Option<Self> {
        Some(f64::from_le_bytes(frame.try_into().ok()?))
    }
}

impl Payload for u64 {
    #[inline(always)]
    fn encode(self) -> [u8; 8] {
        self.to_le_bytes()
    }

    #[inline(always)]
    fn decode(frame: &[u8]) -> Option<Self> {
        Some(u64::from_le_bytes(frame.try_into().ok()?))
    }
}

/// Typed point-to-point message delivery keyed by vertex ownership.
///
/// Sends are asynchronous and never block; the channel guarantees that every
/// message sent during superstep *k* is fully delivered and visible to
/// [`drain`](MessageManager::drain) in superstep *k* + 1, and not earlier.
/// The algorithms assume at most one message per (sender, receiver) pair per
/// round and overwrite rather than accumulate, so no ordering among messages
/// targeting different vertices is guaranteed or needed.
pub trait MessageManager<M: Payload>: Sync {
    /// Delivers `msg` to every distinct remote worker owning an out-neighbor
    /// of inner vertex `v`; each receiver applies it to its own ghost copy
    /// of `v`.
    fn send_along_outgoing_edges(&self, v: usize, msg: M);

    /// Delivers `msg` to the single remote owner of ghost vertex `v`, which
    /// applies it to its inner copy.
    fn sync_to_owner(&self, v: usize, msg: M);

    /// Decodes every message received since the last drain and invokes
    /// `apply` with the local target vertex and the decoded value.
    fn drain<A: FnMut(usize, M)>(&mut self, apply: A) -> Result<(), ComputeError>;

    /// Requests another superstep even if no message was sent this round.
    fn force_continue(&self);
}

/// All-worker sum of a scalar, blocking until every worker has contributed.
///
/// The reduction is associative, commutative and deterministic: every worker
/// obtains the same value, computed in the same order, for the same inputs.
pub trait AllReduce: Sync {
    /// Contributes `local` and returns the sum over all workers.
    ///
    /// Fails with [`ComputeError::Aborted`] if a concurrent worker failed
    /// while this one was parked on the reduction barrier.
    fn all_reduce_sum(&self, local: f64) -> Result<f64, ComputeError>;
}

/// A vertex program run one superstep at a time by a driver.
///
/// The driver invokes [`initial_round`](VertexProgram::initial_round) exactly
/// once, then [`incremental_round`](VertexProgram::incremental_round) until no
/// worker has requested another superstep and no messages are in flight. A
/// round does not return until all local per-vertex work has completed across
/// the engine's threads and every global reduction it issued has returned.
pub trait VertexProgram<F: Fragment> {
    /// The message payload type exchanged by this program.
    type Msg: Payload;

    /// The first superstep: declare initial per-vertex state and seed the
    /// message exchange.
    fn initial_round<M, R>(
        &mut self,
        frag: &F,
        engine: &ParallelEngine,
        messages: &mut M,
        reducer: &R,
    ) -> Result<(), ComputeError>
    where
        M: MessageManager<Self::Msg>,
        R: AllReduce;

    /// Every subsequent superstep: drain received messages, advance state
    /// using locally visible neighbors, and emit messages for the next round.
    fn incremental_round<M, R>(
        &mut self,
        frag: &F,
        engine: &ParallelEngine,
        messages: &mut M,
        reducer: &R,
    ) -> Result<(), ComputeError>
    where
        M: MessageManager<Self::Msg>,
        R: AllReduce;
}
