/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/// Granularity of parallel tasks, specified transparently by vertices or arcs.
///
/// The engine partitions a vertex range into contiguous chunks that threads
/// grab one at a time; this enum expresses how large those chunks should be.
/// Vertex-based granularity is the natural specification for uniform work per
/// vertex; arc-based granularity evens out tasks on graphs with a skewed
/// degree distribution by converting the requested number of arcs into a
/// number of vertices through the average degree.
#[derive(Debug, Clone, Copy)]
pub enum Granularity {
    /// Each task will be formed by the specified number of vertices.
    Vertices(usize),
    /// Each task will be formed by a number of vertices that has,
    /// tentatively, sum of degrees equal to the specified number of arcs.
    Arcs(u64),
}

impl core::default::Default for Granularity {
    /// Returns a default granularity of 1024 vertices.
    fn default() -> Self {
        Self::Vertices(1024)
    }
}

impl Granularity {
    /// Returns a vertex granularity for the given fragment size.
    ///
    /// For the [`Vertices`](Self::Vertices) variant, the specified number of
    /// vertices is returned. For the [`Arcs`](Self::Arcs) variant, the number
    /// of vertices is computed as the specified number of arcs divided by the
    /// average degree.
    ///
    /// # Panics
    ///
    /// Panics if a conversion from arc granularity is needed and the number
    /// of arcs is not provided.
    pub fn vertex_granularity(&self, num_vertices: usize, num_arcs: Option<u64>) -> usize {
        match self {
            Self::Vertices(n) => (*n).max(1),
            Self::Arcs(n) => {
                let average_degree = num_arcs
                    .expect("You need the number of arcs to convert arc granularity")
                    as f64
                    / num_vertices.max(1) as f64;
                ((*n as f64 / average_degree).min(usize::MAX as f64).ceil() as usize).max(1)
            }
        }
    }
}
