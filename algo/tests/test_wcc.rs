/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use bspgraph::engine::ParallelEngine;
use bspgraph::graphs::vec_fragment::VecFragment;
use bspgraph::runtime::{local_mesh, run_local, LocalAllReduce};
use bspgraph::traits::{Fragment, VertexProgram};
use bspgraph_algo::components::{Strategy, Wcc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Adds the reverse of every arc; the algorithm requires a symmetric graph.
fn symmetrize(arcs: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut all: Vec<_> = arcs
        .iter()
        .flat_map(|&(u, v)| [(u, v), (v, u)])
        .collect();
    all.sort_unstable();
    all.dedup();
    all
}

/// Union-find with path halving, mapping every vertex to the minimum global
/// id of its component.
fn reference_components(n: usize, arcs: &[(usize, usize)]) -> Vec<u64> {
    let mut parent: Vec<usize> = (0..n).collect();
    fn find(parent: &mut [usize], mut v: usize) -> usize {
        while parent[v] != v {
            parent[v] = parent[parent[v]];
            v = parent[v];
        }
        v
    }
    for &(u, v) in arcs {
        let (ru, rv) = (find(&mut parent, u), find(&mut parent, v));
        // Union by minimum, so every root is its component's minimum.
        if ru < rv {
            parent[rv] = ru;
        } else {
            parent[ru] = rv;
        }
    }
    (0..n).map(|v| find(&mut parent, v) as u64).collect()
}

/// Runs the distributed computation and gathers the inner component ids by
/// global id.
fn distributed_wcc(
    n: usize,
    arcs: &[(usize, usize)],
    strategy: Strategy,
    num_workers: usize,
    num_threads: usize,
) -> Result<Vec<u64>> {
    let fragments = VecFragment::partition(n, arcs, num_workers);
    let programs: Vec<_> = fragments
        .iter()
        .map(|frag| {
            let mut wcc = Wcc::new(frag);
            wcc.strategy(strategy);
            wcc
        })
        .collect();
    let programs = run_local(&fragments, programs, num_threads)?;

    let mut components = vec![0; n];
    for (frag, wcc) in fragments.iter().zip(&programs) {
        for v in frag.inner_vertices() {
            components[frag.global_id(v) as usize] = wcc.component(v);
        }
    }
    Ok(components)
}

/// A pseudorandom symmetric graph over `n` vertices.
fn random_symmetric(n: usize, arcs: usize, seed: u64) -> Vec<(usize, usize)> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let arcs: Vec<_> = (0..arcs)
        .map(|_| (rng.random_range(0..n), rng.random_range(0..n)))
        .filter(|&(u, v)| u != v)
        .collect();
    symmetrize(&arcs)
}

#[test]
fn test_two_triangles() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let arcs = symmetrize(&[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
    for num_workers in [1, 2, 3] {
        let components = distributed_wcc(6, &arcs, Strategy::Adaptive, num_workers, 2)?;
        assert_eq!(
            components,
            vec![0, 0, 0, 3, 3, 3],
            "with {num_workers} worker(s)"
        );
    }
    Ok(())
}

#[test]
fn test_two_triangles_converge_within_two_rounds() -> Result<()> {
    // Drive the rounds by hand on a single worker to count them.
    let arcs = symmetrize(&[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
    let fragments = VecFragment::partition(6, &arcs, 1);
    let frag = &fragments[0];
    let engine = ParallelEngine::new(2)?;
    let mut messages = local_mesh(&fragments).pop().unwrap();
    let reducer = LocalAllReduce::handles(1).pop().unwrap();

    let mut wcc = Wcc::new(frag);
    wcc.initial_round(frag, &engine, &mut messages, &reducer)?;
    let mut rounds = 0;
    while messages.take_continue() {
        messages.advance_round();
        wcc.incremental_round(frag, &engine, &mut messages, &reducer)?;
        rounds += 1;
    }
    assert!(rounds <= 2, "took {rounds} incremental rounds");
    assert_eq!(wcc.components(), vec![0, 0, 0, 3, 3, 3]);
    Ok(())
}

#[test]
fn test_converged_state_is_a_fixpoint() -> Result<()> {
    let arcs = random_symmetric(50, 60, 7);
    let fragments = VecFragment::partition(50, &arcs, 1);
    let frag = &fragments[0];
    let engine = ParallelEngine::new(2)?;
    let mut messages = local_mesh(&fragments).pop().unwrap();
    let reducer = LocalAllReduce::handles(1).pop().unwrap();

    let mut wcc = Wcc::new(frag);
    wcc.initial_round(frag, &engine, &mut messages, &reducer)?;
    while messages.take_continue() {
        messages.advance_round();
        wcc.incremental_round(frag, &engine, &mut messages, &reducer)?;
    }

    // One more round on the converged state: nothing changes, nothing
    // signals continuation.
    let converged = wcc.components();
    messages.advance_round();
    wcc.incremental_round(frag, &engine, &mut messages, &reducer)?;
    assert!(!messages.take_continue());
    assert_eq!(wcc.components(), converged);
    Ok(())
}

#[test]
fn test_matches_union_find_on_random_graphs() -> Result<()> {
    for seed in 0..4 {
        let arcs = random_symmetric(300, 350, seed);
        let expected = reference_components(300, &arcs);
        for num_workers in [1, 3] {
            let components = distributed_wcc(300, &arcs, Strategy::Adaptive, num_workers, 2)?;
            assert_eq!(components, expected, "seed {seed}, {num_workers} worker(s)");
        }
    }
    Ok(())
}

#[test]
fn test_forced_push_and_pull_are_equivalent() -> Result<()> {
    let arcs = random_symmetric(200, 260, 42);
    let expected = reference_components(200, &arcs);
    for strategy in [Strategy::Push, Strategy::Pull, Strategy::Adaptive] {
        for num_workers in [1, 2] {
            let components = distributed_wcc(200, &arcs, strategy, num_workers, 2)?;
            assert_eq!(
                components, expected,
                "strategy {strategy}, {num_workers} worker(s)"
            );
        }
    }
    Ok(())
}

#[test]
fn test_singletons_converge_to_their_own_id() -> Result<()> {
    let components = distributed_wcc(5, &[], Strategy::Adaptive, 2, 1)?;
    assert_eq!(components, vec![0, 1, 2, 3, 4]);
    Ok(())
}

#[test]
fn test_self_loops_are_harmless() -> Result<()> {
    let arcs = symmetrize(&[(0, 0), (0, 1), (2, 2)]);
    let components = distributed_wcc(3, &arcs, Strategy::Adaptive, 2, 1)?;
    assert_eq!(components, vec![0, 0, 2]);
    Ok(())
}

#[test]
#[should_panic(expected = "activity threshold")]
fn test_threshold_out_of_range_panics() {
    let fragments = VecFragment::partition(1, &[], 1);
    Wcc::new(&fragments[0]).activity_threshold(1.5);
}
