/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::error::ComputeError;
use crate::runtime::barrier::AbortBarrier;
use crate::traits::AllReduce;
use kahan::KahanSum;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct ReduceShared {
    /// One slot per worker, holding the bits of the contributed `f64`.
    slots: Box<[AtomicU64]>,
    barrier: AbortBarrier,
}

/// A barrier-based [`AllReduce`] for workers sharing an address space.
///
/// Each worker writes its contribution into its own slot, waits for everyone,
/// and sums the slots in rank order with compensated summation, so every
/// worker computes bit-identical results regardless of arrival order. A
/// second barrier keeps the slots stable until every worker has read them.
pub struct LocalAllReduce {
    shared: Arc<ReduceShared>,
    rank: usize,
}

impl LocalAllReduce {
    /// Builds one connected handle per worker.
    pub fn handles(num_workers: usize) -> Vec<LocalAllReduce> {
        let shared = Arc::new(ReduceShared {
            slots: (0..num_workers).map(|_| AtomicU64::new(0)).collect(),
            barrier: AbortBarrier::new(num_workers),
        });
        (0..num_workers)
            .map(|rank| LocalAllReduce {
                shared: shared.clone(),
                rank,
            })
            .collect()
    }

    /// Releases every worker parked on the reduction barrier with an error.
    pub(crate) fn abort(&self) {
        self.shared.barrier.abort();
    }
}

impl AllReduce for LocalAllReduce {
    fn all_reduce_sum(&self, local: f64) -> Result<f64, ComputeError> {
        self.shared.slots[self.rank].store(local.to_bits(), Ordering::Relaxed);
        self.shared.barrier.wait()?;
        let mut sum: KahanSum<f64> = KahanSum::new();
        for slot in self.shared.slots.iter() {
            sum += f64::from_bits(slot.load(Ordering::Relaxed));
        }
        self.shared.barrier.wait()?;
        Ok(sum.sum())
    }
}
