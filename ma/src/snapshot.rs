//! Distributed snapshot protocol (§4.8): the agent that first reaches a goal state broadcasts
//! `SnapshotInit(token, c)` around the ring (`SnapshotInit` also carries every ring hop — it
//! doubles as the `Mark`). The marker makes two laps: lap one lets every peer record a local lower
//! bound (the better of its own open-list top and `c`, refined as `PublicState`s keep arriving);
//! lap two, retriggered by the initiator once the marker first comes home, lets each peer close
//! its observation window and report its bound back to the initiator. `c` is globally optimal iff
//! every reported bound is at least `c`.

use crate::comm::{Comm, CommError};
use crate::message::Message;
use hashbrown::HashMap;

struct TokenState {
    cost: u32,
    initiator: u32,
    lowest: u32,
}

struct InitiatorState {
    token: u32,
    cost: u32,
    responses: HashMap<u32, u32>,
    laps: u8,
}

/// Per-agent snapshot state machine. An agent can be marked as a peer for several tokens at once
/// (overlapping snapshot attempts at different costs) but only ever drives one as initiator.
#[derive(Default)]
pub struct Snapshot {
    tokens: HashMap<u32, TokenState>,
    initiator: Option<InitiatorState>,
}

impl Snapshot {
    pub fn new() -> Self {
        Snapshot::default()
    }

    pub fn is_initiating(&self) -> bool {
        self.initiator.is_some()
    }

    /// Starts a snapshot attempt for a goal found at cost `cost`. `local_top` is this agent's own
    /// current best open-list estimate, recorded directly as if it had already marked itself.
    pub fn initiate(&mut self, id: u32, token: u32, cost: u32, local_top: u32, comm: &impl Comm) -> Result<(), CommError> {
        let mut responses = HashMap::new();
        responses.insert(id, local_top.min(cost));
        self.initiator = Some(InitiatorState { token, cost, responses, laps: 0 });
        comm.send_in_ring(Message::SnapshotInit { token, cost, initiator: id })
    }

    /// Handles a received `SnapshotInit`, whether it is a peer's first/second receipt of a mark
    /// or the initiator seeing its own token complete a lap.
    pub fn handle_init(
        &mut self,
        id: u32,
        token: u32,
        cost: u32,
        initiator: u32,
        local_top: u32,
        comm: &impl Comm,
    ) -> Result<(), CommError> {
        if initiator == id {
            if let Some(state) = self.initiator.as_mut().filter(|s| s.token == token) {
                state.laps += 1;
                if state.laps == 1 {
                    return comm.send_in_ring(Message::SnapshotInit { token, cost, initiator });
                }
            }
            return Ok(());
        }
        match self.tokens.remove(&token) {
            None => {
                self.tokens.insert(
                    token,
                    TokenState {
                        cost,
                        initiator,
                        lowest: local_top.min(cost),
                    },
                );
                comm.send_in_ring(Message::SnapshotInit { token, cost, initiator })
            }
            Some(state) => {
                comm.send_to(
                    initiator,
                    Message::SnapshotResponse {
                        token,
                        from: id,
                        lowest: state.lowest,
                    },
                )?;
                comm.send_in_ring(Message::SnapshotInit { token, cost, initiator })
            }
        }
    }

    /// Lets an arriving `PublicState`'s cost tighten every token this agent is still marked for
    /// (between its own mark and the second lap closing it).
    pub fn observe_public_cost(&mut self, cost: u32) {
        for state in self.tokens.values_mut() {
            state.lowest = state.lowest.min(cost);
        }
    }

    /// Initiator side: records a peer's reported bound. Returns `Some(cost)` once every peer has
    /// reported and every bound is at least `cost` — optimality is confirmed and `SnapshotFinal`
    /// has just been broadcast. Returns `None` while still waiting, or once the round completes
    /// without confirming (the caller should keep searching for a cheaper goal).
    pub fn handle_response(
        &mut self,
        token: u32,
        from: u32,
        lowest: u32,
        num_peers: u32,
        comm: &impl Comm,
    ) -> Result<Option<u32>, CommError> {
        let confirmed = {
            let Some(state) = self.initiator.as_mut().filter(|s| s.token == token) else {
                return Ok(None);
            };
            state.responses.insert(from, lowest);
            if state.responses.len() as u32 != num_peers {
                return Ok(None);
            }
            let cost = state.cost;
            let optimal = state.responses.values().all(|&l| l >= cost);
            optimal.then_some(cost)
        };
        self.initiator = None;
        if let Some(cost) = confirmed {
            comm.send_to_all(Message::SnapshotFinal { token, cost })?;
        }
        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm_queue::build_pool;

    #[test]
    fn double_lap_ring_confirms_optimal_cost() {
        let pool = build_pool(3);
        let mut snaps: Vec<Snapshot> = (0..3).map(|_| Snapshot::new()).collect();
        let local_tops = [12u32, 11, 15];

        snaps[0].initiate(0, 7, 10, local_tops[0], &pool[0]).unwrap();

        // lap one: 0 -> 1 -> 2 -> 0
        let Message::SnapshotInit { token, cost, initiator } = pool[1].recv_block().unwrap() else {
            panic!("expected init at 1")
        };
        snaps[1].handle_init(1, token, cost, initiator, local_tops[1], &pool[1]).unwrap();

        let Message::SnapshotInit { token, cost, initiator } = pool[2].recv_block().unwrap() else {
            panic!("expected init at 2")
        };
        snaps[2].handle_init(2, token, cost, initiator, local_tops[2], &pool[2]).unwrap();

        let Message::SnapshotInit { token, cost, initiator } = pool[0].recv_block().unwrap() else {
            panic!("expected lap one to return home")
        };
        assert!(snaps[0].is_initiating());
        snaps[0].handle_init(0, token, cost, initiator, local_tops[0], &pool[0]).unwrap();

        // lap two: 0 -> 1 (closes, replies) -> 2 (closes, replies) -> 0 (drops, already done)
        let Message::SnapshotInit { token, cost, initiator } = pool[1].recv_block().unwrap() else {
            panic!("expected second init at 1")
        };
        snaps[1].handle_init(1, token, cost, initiator, local_tops[1], &pool[1]).unwrap();

        let Message::SnapshotResponse { token, from, lowest } = pool[0].recv_block().unwrap() else {
            panic!("expected response from 1")
        };
        assert_eq!(snaps[0].handle_response(token, from, lowest, 3, &pool[0]).unwrap(), None);

        let Message::SnapshotInit { token, cost, initiator } = pool[2].recv_block().unwrap() else {
            panic!("expected second init at 2")
        };
        snaps[2].handle_init(2, token, cost, initiator, local_tops[2], &pool[2]).unwrap();

        let Message::SnapshotResponse { token, from, lowest } = pool[0].recv_block().unwrap() else {
            panic!("expected response from 2")
        };
        let outcome = snaps[0].handle_response(token, from, lowest, 3, &pool[0]).unwrap();
        assert_eq!(outcome, Some(10));

        // the lap-two marker also lands back home; the initiator just drops it.
        snaps[0].handle_init(0, 7, 10, 0, local_tops[0], &pool[0]).unwrap();

        // peers 1 and 2 each got the broadcasted SnapshotFinal.
        assert_eq!(pool[1].recv().unwrap(), Some(Message::SnapshotFinal { token: 7, cost: 10 }));
        assert_eq!(pool[2].recv().unwrap(), Some(Message::SnapshotFinal { token: 7, cost: 10 }));
    }

    #[test]
    fn a_bound_below_cost_fails_to_confirm() {
        let pool = build_pool(2);
        let mut snaps: Vec<Snapshot> = (0..2).map(|_| Snapshot::new()).collect();

        snaps[0].initiate(0, 1, 10, 10, &pool[0]).unwrap();
        let Message::SnapshotInit { token, cost, initiator } = pool[1].recv_block().unwrap() else {
            panic!()
        };
        // peer's own bound is below cost: it can never confirm optimality this round.
        snaps[1].handle_init(1, token, cost, initiator, 3, &pool[1]).unwrap();
        let Message::SnapshotInit { token, cost, initiator } = pool[0].recv_block().unwrap() else {
            panic!()
        };
        snaps[0].handle_init(0, token, cost, initiator, 10, &pool[0]).unwrap();
        let Message::SnapshotInit { token, cost, initiator } = pool[1].recv_block().unwrap() else {
            panic!()
        };
        snaps[1].handle_init(1, token, cost, initiator, 3, &pool[1]).unwrap();
        let Message::SnapshotResponse { token, from, lowest } = pool[0].recv_block().unwrap() else {
            panic!()
        };
        assert_eq!(snaps[0].handle_response(token, from, lowest, 2, &pool[0]).unwrap(), None);
    }
}
