/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Connected-component algorithms.

mod label_store;
mod wcc;

pub use wcc::{Strategy, Wcc};
