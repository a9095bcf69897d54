/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::error::ComputeError;
use std::sync::{Condvar, Mutex};

/// A reusable barrier whose waiters can be released with an error.
///
/// [`std::sync::Barrier`] would deadlock the surviving workers if one of them
/// failed mid-superstep; this barrier instead propagates the failure: once
/// [`abort`](AbortBarrier::abort) has been called, every current and future
/// [`wait`](AbortBarrier::wait) returns [`ComputeError::Aborted`]. The abort
/// flag is sticky, as a computation is never resumed after a failure.
pub(crate) struct AbortBarrier {
    parties: usize,
    state: Mutex<State>,
    condvar: Condvar,
}

struct State {
    arrived: usize,
    generation: u64,
    aborted: bool,
}

impl AbortBarrier {
    pub(crate) fn new(parties: usize) -> Self {
        Self {
            parties,
            state: Mutex::new(State {
                arrived: 0,
                generation: 0,
                aborted: false,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Blocks until all parties have arrived, returning whether this caller
    /// was the last one (the leader), or [`ComputeError::Aborted`] if the
    /// barrier was aborted while waiting.
    pub(crate) fn wait(&self) -> Result<bool, ComputeError> {
        let mut state = self.state.lock().unwrap();
        if state.aborted {
            return Err(ComputeError::Aborted);
        }
        state.arrived += 1;
        if state.arrived == self.parties {
            state.arrived = 0;
            state.generation += 1;
            self.condvar.notify_all();
            return Ok(true);
        }
        let generation = state.generation;
        while state.generation == generation && !state.aborted {
            state = self.condvar.wait(state).unwrap();
        }
        if state.aborted {
            Err(ComputeError::Aborted)
        } else {
            Ok(false)
        }
    }

    /// Releases all waiters with an error and poisons the barrier.
    pub(crate) fn abort(&self) {
        let mut state = self.state.lock().unwrap();
        state.aborted = true;
        self.condvar.notify_all();
    }
}
