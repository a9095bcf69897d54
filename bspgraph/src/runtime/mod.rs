/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The in-memory multi-worker runtime.
//!
//! This module runs a [vertex program](crate::traits::VertexProgram) over a
//! set of fragments with one OS thread per worker, providing the collaborators
//! the program consumes: a channel-based [message
//! manager](LocalMessageManager) with round-parity double buffering, a
//! barrier-based [global reducer](LocalAllReduce), and the lockstep round
//! protocol itself ([`run_local`]).
//!
//! The runtime mirrors a distributed deployment faithfully enough to test the
//! full execution contract: messages sent in round *k* become visible exactly
//! in round *k* + 1, the continuation decision is a global disjunction of
//! per-worker signals and in-flight messages, and a worker failing mid-round
//! aborts every synchronization point so that no peer hangs.

mod barrier;
mod driver;
mod message;
mod reduce;

pub use driver::{run_local, run_local_with_logging};
pub use message::{local_mesh, LocalMessageManager};
pub use reduce::LocalAllReduce;
