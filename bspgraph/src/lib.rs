/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(unreachable_code)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]

pub mod active_set;
pub mod engine;
pub mod error;
pub mod graphs;
pub mod runtime;
pub mod traits;
pub mod utils;

pub mod prelude {
    pub use crate::active_set::ActiveSet;
    pub use crate::engine::ParallelEngine;
    pub use crate::error::ComputeError;
    pub use crate::graphs::vec_fragment::VecFragment;
    pub use crate::runtime::{local_mesh, run_local, LocalAllReduce, LocalMessageManager};
    pub use crate::traits::{AllReduce, Fragment, MessageManager, Payload, VertexProgram};
    pub use crate::utils::Granularity;
}
