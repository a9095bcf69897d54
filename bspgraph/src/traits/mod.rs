/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Traits at the seams of the execution model.
//!
//! A computation is the interplay of four collaborators: a read-only
//! [fragment view](Fragment) of the partitioned graph, a typed [message
//! channel](MessageManager) delivering values between fragment owners, a
//! blocking [global reducer](AllReduce), and the [vertex
//! program](VertexProgram) driving all of them one superstep at a time.
//! The per-worker parallel engine is a concrete type
//! ([`ParallelEngine`](crate::engine::ParallelEngine)) rather than a trait,
//! as it is passed around by reference exactly like a thread pool.

mod fragment;
mod program;

pub use fragment::Fragment;
pub use program::{AllReduce, MessageManager, Payload, VertexProgram};
