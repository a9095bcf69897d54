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
#![deny(unused_doc_comments)]

pub mod components;
pub mod rank;

pub mod prelude {
    pub use crate::components::{Strategy, Wcc};
    pub use crate::rank::pagerank::PageRank;
}
