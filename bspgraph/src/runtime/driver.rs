/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::engine::ParallelEngine;
use crate::error::ComputeError;
use crate::runtime::barrier::AbortBarrier;
use crate::runtime::message::{local_mesh, LocalMessageManager};
use crate::runtime::reduce::LocalAllReduce;
use crate::traits::{Fragment, VertexProgram};
use anyhow::{ensure, Context, Result};
use crossbeam_utils::CachePadded;
use dsi_progress_logger::{no_logging, ConcurrentProgressLog};
use std::sync::atomic::{AtomicBool, Ordering};

/// Per-round synchronization shared by all workers.
///
/// Each worker publishes its continuation signal into its own vote slot; the
/// global decision is the disjunction of the votes, read by every worker
/// between two barrier phases so that no vote for the next round can race
/// with a read for the current one.
struct RoundSync {
    votes: Box<[CachePadded<AtomicBool>]>,
    barrier: AbortBarrier,
}

impl RoundSync {
    fn new(num_workers: usize) -> Self {
        Self {
            votes: (0..num_workers)
                .map(|_| CachePadded::new(AtomicBool::new(false)))
                .collect(),
            barrier: AbortBarrier::new(num_workers),
        }
    }

    /// Publishes this worker's continuation signal and returns the global
    /// decision for the round.
    fn decide(&self, rank: usize, keep_going: bool) -> Result<bool, ComputeError> {
        self.votes[rank].store(keep_going, Ordering::Relaxed);
        self.barrier.wait()?;
        let decision = self.votes.iter().any(|vote| vote.load(Ordering::Relaxed));
        self.barrier.wait()?;
        Ok(decision)
    }
}

/// Runs a vertex program over the given fragments until global quiescence,
/// without logging.
///
/// See [`run_local_with_logging`].
pub fn run_local<F, P>(
    fragments: &[F],
    programs: Vec<P>,
    threads_per_worker: usize,
) -> Result<Vec<P>>
where
    F: Fragment,
    P: VertexProgram<F> + Send,
{
    run_local_with_logging(fragments, programs, threads_per_worker, no_logging![])
}

/// Runs a vertex program over the given fragments until global quiescence.
///
/// One OS thread is spawned per fragment; each worker acquires its own
/// [`ParallelEngine`] with `threads_per_worker` threads (zero meaning one per
/// available CPU) and releases it when the computation terminates. The
/// initial round runs exactly once, then incremental rounds run until no
/// worker signals continuation and no messages are in flight.
///
/// On success the programs are returned in worker order, holding the
/// converged per-vertex state. If any worker fails, the whole computation
/// aborts and the first causal error is returned; no partial results are
/// produced.
///
/// `cpl` is a [`ConcurrentProgressLog`] counting supersteps; it is cloned
/// into the workers and updated once per round.
pub fn run_local_with_logging<F, P>(
    fragments: &[F],
    programs: Vec<P>,
    threads_per_worker: usize,
    cpl: &mut (impl ConcurrentProgressLog + Send),
) -> Result<Vec<P>>
where
    F: Fragment,
    P: VertexProgram<F> + Send,
{
    ensure!(
        fragments.len() == programs.len(),
        "Got {} fragments but {} programs",
        fragments.len(),
        programs.len()
    );
    let num_workers = fragments.len();
    if num_workers == 0 {
        return Ok(Vec::new());
    }

    log::info!("Workers: {}", num_workers);
    log::info!("Threads per worker: {}", threads_per_worker);

    let sync = RoundSync::new(num_workers);
    let mesh = local_mesh(fragments);
    let reducers = LocalAllReduce::handles(num_workers);

    cpl.item_name("superstep");
    cpl.expected_updates(None);
    cpl.start("Running supersteps...");

    let results: Vec<Result<P>> = std::thread::scope(|scope| {
        let sync = &sync;
        let handles: Vec<_> = fragments
            .iter()
            .zip(programs)
            .zip(mesh)
            .zip(reducers)
            .enumerate()
            .map(|(rank, (((frag, program), messages), reducer))| {
                let mut worker_cpl = cpl.clone();
                scope.spawn(move || {
                    let result = worker_loop(
                        rank,
                        frag,
                        program,
                        messages,
                        &reducer,
                        sync,
                        threads_per_worker,
                        &mut worker_cpl,
                    );
                    if result.is_err() {
                        // Release every peer parked on a synchronization
                        // point; the abort is sticky.
                        sync.barrier.abort();
                        reducer.abort();
                    }
                    result
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("A worker thread panicked"))
            .collect()
    });

    cpl.done();

    // Report the causal error, not the aborts it induced in the other
    // workers.
    let mut programs = Vec::with_capacity(num_workers);
    let mut abort = None;
    let mut cause = None;
    for result in results {
        match result {
            Ok(program) => programs.push(program),
            Err(e) => match e.downcast_ref::<ComputeError>() {
                Some(ComputeError::Aborted) => abort = abort.or(Some(e)),
                _ => cause = cause.or(Some(e)),
            },
        }
    }
    if let Some(e) = cause.or(abort) {
        return Err(e);
    }
    Ok(programs)
}

#[allow(clippy::too_many_arguments)]
fn worker_loop<F, P>(
    rank: usize,
    frag: &F,
    mut program: P,
    mut messages: LocalMessageManager<'_, F>,
    reducer: &LocalAllReduce,
    sync: &RoundSync,
    threads_per_worker: usize,
    cpl: &mut impl ConcurrentProgressLog,
) -> Result<P>
where
    F: Fragment,
    P: VertexProgram<F>,
{
    let engine = ParallelEngine::new(threads_per_worker)
        .with_context(|| format!("Could not create the engine of worker {}", rank))?;

    program
        .initial_round(frag, &engine, &mut messages, reducer)
        .with_context(|| format!("Worker {} failed in the initial round", rank))?;

    let mut superstep = 1;
    loop {
        if rank == 0 {
            cpl.update();
        }
        let keep_going = messages.take_continue();
        if !sync.decide(rank, keep_going)? {
            break;
        }
        messages.advance_round();
        program
            .incremental_round(frag, &engine, &mut messages, reducer)
            .with_context(|| format!("Worker {} failed in superstep {}", rank, superstep))?;
        superstep += 1;
    }

    log::debug!("Worker {} finished after {} superstep(s)", rank, superstep);
    Ok(program)
}
