/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::error::ComputeError;
use crate::traits::{Fragment, MessageManager, Payload};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A message frame on the local wire: the global id of the target vertex and
/// the encoded payload.
struct Envelope {
    target: u64,
    frame: Box<[u8]>,
}

/// A channel-based [`MessageManager`] for workers sharing an address space.
///
/// Every worker owns two unbounded inboxes, one per round parity; a message
/// sent during round *k* goes to the inbox of parity *k* + 1 and is drained
/// only there. Since the round protocol separates rounds with a barrier, this
/// double buffering is what guarantees the core ordering property of the
/// channel: a send in round *k* is visible in round *k* + 1, in full, and
/// never earlier.
///
/// Routing is resolved at construction time: for each inner vertex the
/// distinct remote owners of its out-neighbors are precomputed, so
/// [`send_along_outgoing_edges`](MessageManager::send_along_outgoing_edges)
/// sends at most one message per remote fragment.
pub struct LocalMessageManager<'a, F: Fragment> {
    frag: &'a F,
    rank: usize,
    /// Senders towards every worker, one per round parity.
    peers: Vec<[Sender<Envelope>; 2]>,
    /// This worker's inboxes, one per round parity.
    inbox: [Receiver<Envelope>; 2],
    /// For each inner vertex, the distinct remote ranks owning at least one
    /// of its out-neighbors.
    out_dests: Vec<Box<[usize]>>,
    round: usize,
    sent: AtomicU64,
    forced: AtomicBool,
}

/// Builds one connected [`LocalMessageManager`] per fragment.
pub fn local_mesh<F: Fragment>(fragments: &[F]) -> Vec<LocalMessageManager<'_, F>> {
    let num_workers = fragments.len();
    let mut senders = Vec::with_capacity(num_workers);
    let mut inboxes = Vec::with_capacity(num_workers);
    for _ in 0..num_workers {
        let (even_tx, even_rx) = crossbeam_channel::unbounded();
        let (odd_tx, odd_rx) = crossbeam_channel::unbounded();
        senders.push([even_tx, odd_tx]);
        inboxes.push([even_rx, odd_rx]);
    }

    fragments
        .iter()
        .zip(inboxes)
        .enumerate()
        .map(|(rank, (frag, inbox))| {
            let out_dests = frag
                .inner_vertices()
                .map(|v| {
                    let mut dests: Vec<usize> = frag
                        .outgoing(v)
                        .into_iter()
                        .map(|(u, _)| frag.owner_rank(u))
                        .filter(|&r| r != rank)
                        .collect();
                    dests.sort_unstable();
                    dests.dedup();
                    dests.into_boxed_slice()
                })
                .collect();
            LocalMessageManager {
                frag,
                rank,
                peers: senders.clone(),
                inbox,
                out_dests,
                round: 0,
                sent: AtomicU64::new(0),
                forced: AtomicBool::new(false),
            }
        })
        .collect()
}

impl<F: Fragment> LocalMessageManager<'_, F> {
    /// The parity of the inboxes receiving this round's sends.
    #[inline(always)]
    fn send_parity(&self) -> usize {
        (self.round + 1) & 1
    }

    #[inline(always)]
    fn post(&self, dest: usize, target: u64, frame: [u8; 8]) {
        // Local neighbors read shared memory; messages only cross fragments.
        debug_assert_ne!(dest, self.rank);
        // A peer that already failed has dropped its inboxes; losing the
        // message is fine, as the computation is aborting anyway.
        let _ = self.peers[dest][self.send_parity()].send(Envelope {
            target,
            frame: Box::new(frame),
        });
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Advances to the next round, flipping the inbox parity.
    ///
    /// The driver calls this between supersteps, after the continuation
    /// decision; so must any code driving rounds by hand.
    pub fn advance_round(&mut self) {
        self.round += 1;
    }

    /// Consumes and returns this round's continuation signal: whether a
    /// continuation was forced or any message was sent.
    pub fn take_continue(&mut self) -> bool {
        let forced = self.forced.swap(false, Ordering::Relaxed);
        let sent = self.sent.swap(0, Ordering::Relaxed);
        forced || sent > 0
    }
}

impl<F: Fragment, M: Payload> MessageManager<M> for LocalMessageManager<'_, F> {
    fn send_along_outgoing_edges(&self, v: usize, msg: M) {
        debug_assert!(self.frag.is_inner(v));
        let dests = &self.out_dests[v];
        if dests.is_empty() {
            return;
        }
        let target = self.frag.global_id(v);
        let frame = msg.encode();
        for &dest in dests.iter() {
            self.post(dest, target, frame);
        }
    }

    fn sync_to_owner(&self, v: usize, msg: M) {
        debug_assert!(!self.frag.is_inner(v));
        self.post(self.frag.owner_rank(v), self.frag.global_id(v), msg.encode());
    }

    fn drain<A: FnMut(usize, M)>(&mut self, mut apply: A) -> Result<(), ComputeError> {
        for envelope in self.inbox[self.round & 1].try_iter() {
            let msg = M::decode(&envelope.frame).ok_or_else(|| {
                ComputeError::MessageDecode(format!(
                    "payload frame of {} bytes",
                    envelope.frame.len()
                ))
            })?;
            let v = self.frag.local_by_global(envelope.target).ok_or_else(|| {
                ComputeError::MessageDecode(format!("unknown vertex id {}", envelope.target))
            })?;
            apply(v, msg);
        }
        Ok(())
    }

    fn force_continue(&self) {
        self.forced.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graphs::vec_fragment::VecFragment;

    /// Two workers over 0 -> 1 with both endpoints on different fragments.
    fn mesh_pair() -> Vec<VecFragment> {
        VecFragment::partition(2, &[(0, 1)], 2)
    }

    #[test]
    fn test_send_along_outgoing_edges_reaches_ghost() -> Result<(), ComputeError> {
        let frags = mesh_pair();
        let mut mesh = local_mesh(&frags);
        let mut mm1 = mesh.pop().unwrap();
        let mut mm0 = mesh.pop().unwrap();

        // Worker 0 sends the rank of vertex 0 along 0 -> 1.
        MessageManager::<f64>::send_along_outgoing_edges(&mm0, 0, 0.25);
        assert!(mm0.take_continue());
        assert!(!mm1.take_continue());

        // Nothing is visible in the sending round.
        mm1.drain(|_, _: f64| panic!("message visible too early"))?;

        mm0.advance_round();
        mm1.advance_round();
        let mut received = Vec::new();
        mm1.drain(|v, msg: f64| received.push((v, msg)))?;
        // Worker 1 resolves the sender's gid to its ghost copy.
        let ghost = frags[1].local_by_global(0).unwrap();
        assert_eq!(received, vec![(ghost, 0.25)]);
        Ok(())
    }

    #[test]
    fn test_sync_to_owner_reaches_inner_copy() -> Result<(), ComputeError> {
        let frags = mesh_pair();
        let mut mesh = local_mesh(&frags);
        let mut mm1 = mesh.pop().unwrap();
        let mm0 = mesh.pop().unwrap();

        // Worker 0 lowers its ghost of vertex 1 and syncs it to worker 1.
        let ghost = frags[0].local_by_global(1).unwrap();
        MessageManager::<u64>::sync_to_owner(&mm0, ghost, 0);

        mm1.advance_round();
        let mut received = Vec::new();
        mm1.drain(|v, msg: u64| received.push((v, msg)))?;
        let inner = frags[1].local_by_global(1).unwrap();
        assert!(frags[1].is_inner(inner));
        assert_eq!(received, vec![(inner, 0)]);
        Ok(())
    }

    #[test]
    fn test_malformed_frame_is_a_decode_error() {
        let frags = mesh_pair();
        let mut mesh = local_mesh(&frags);
        let mut mm1 = mesh.pop().unwrap();
        let mm0 = mesh.pop().unwrap();

        // A truncated frame injected on the wire.
        let _ = mm0.peers[1][1].send(Envelope {
            target: 1,
            frame: vec![0xde, 0xad].into_boxed_slice(),
        });
        mm1.advance_round();
        let result = mm1.drain(|_, _: u64| {});
        assert!(matches!(result, Err(ComputeError::MessageDecode(_))));
    }

    #[test]
    fn test_unknown_target_is_a_decode_error() {
        let frags = mesh_pair();
        let mut mesh = local_mesh(&frags);
        let mut mm1 = mesh.pop().unwrap();
        let mm0 = mesh.pop().unwrap();

        let _ = mm0.peers[1][1].send(Envelope {
            target: 42,
            frame: Box::new(7u64.encode()),
        });
        mm1.advance_round();
        let result = mm1.drain(|_, _: u64| {});
        assert!(matches!(result, Err(ComputeError::MessageDecode(_))));
    }

    #[test]
    fn test_force_continue_is_consumed() {
        let frags = mesh_pair();
        let mut mesh = local_mesh(&frags);
        let mut mm0 = mesh.remove(0);
        MessageManager::<u64>::force_continue(&mm0);
        assert!(mm0.take_continue());
        assert!(!mm0.take_continue());
    }
}
