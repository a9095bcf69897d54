/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Errors aborting a computation.
//!
//! All errors at this layer are fatal: per-vertex state is mutated in place,
//! so a superstep cannot be re-run after a partial failure, and the algorithms
//! have no redundancy with which to recover a lost update. A worker that
//! detects an error reports it immediately and the whole computation aborts;
//! no partially converged result is ever returned.

use thiserror::Error;

/// A fatal error detected by a worker during a computation.
#[derive(Error, Debug)]
pub enum ComputeError {
    /// The input graph violates a precondition shared by all workers, such as
    /// having no vertices at all or a vertex whose outdegree overflows the
    /// degree counter.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// A message received from the channel could not be decoded: either the
    /// payload frame has the wrong size or the carried vertex id is unknown
    /// to the receiving fragment.
    #[error("cannot decode message: {0}")]
    MessageDecode(String),

    /// A concurrent worker failed, releasing this worker from a
    /// synchronization point before the computation could complete.
    #[error("computation aborted by a failed worker")]
    Aborted,
}
