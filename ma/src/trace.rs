//! Distributed path reconstruction (§4.8): once a snapshot confirms a goal cost is globally
//! optimal, the initiator walks its own `StateSpace` parent pointers backward. If it runs off the
//! end of its local history onto a state that arrived as someone else's `PublicState`, it forwards
//! what it has traced so far to that agent, which extends it with its own local segment and
//! forwards again — until a state with no external origin and no parent (the true initial state)
//! is reached, at which point the accumulated `ops` is the complete plan.

use crate::comm::{Comm, CommError};
use crate::message::{Message, TracePath};
use plan_core::{OpId, StateID, StateSpace};

/// The result of tracing as far as possible through one agent's local `StateSpace`.
pub enum TraceStep {
    /// Ran off the back of recorded history: `ops` (forward order) is the complete plan.
    Root { ops: Vec<OpId> },
    /// Hit a state that was originally `sender`'s public state `remote_id`; `ops` (forward order)
    /// is this agent's segment and must be prepended by `sender` before it forwards again.
    External { sender: u32, remote_id: StateID, ops: Vec<OpId> },
}

/// Walks `space` backward from `from`, stopping at the first externally-originated state or the
/// true root. A state can carry both a parent pointer and an external origin (it was generated
/// locally by applying an operator to a state merged in from a peer); the origin always takes
/// precedence, since the peer's own history continues further back than anything this agent knows.
pub fn trace_local(space: &StateSpace, from: StateID) -> TraceStep {
    let mut ops = Vec::new();
    let mut current = from;
    loop {
        let Some(node) = space.get(current) else {
            ops.reverse();
            return TraceStep::Root { ops };
        };
        if let Some(origin) = node.external_origin {
            ops.reverse();
            return TraceStep::External {
                sender: origin.sender,
                remote_id: origin.remote_id,
                ops,
            };
        }
        match (node.parent, node.generating_op) {
            (Some(parent), Some(op)) => {
                ops.push(op);
                current = parent;
            }
            _ => {
                ops.reverse();
                return TraceStep::Root { ops };
            }
        }
    }
}

/// Sends an `External` step onward: `local_ops` (this agent's segment, forward order) is
/// prepended to whatever had already accumulated, and the message is addressed to `sender` to
/// resume tracing from its own `remote_id`.
pub fn forward(
    comm: &impl Comm,
    id: u32,
    token: u32,
    sender: u32,
    remote_id: StateID,
    local_ops: &[OpId],
    mut accumulated: Vec<u32>,
) -> Result<(), CommError> {
    let mut ops: Vec<u32> = local_ops.iter().map(|op| op.to_u32()).collect();
    ops.append(&mut accumulated);
    comm.send_to(
        sender,
        Message::TracePath(TracePath {
            token,
            origin: id,
            resume_state: remote_id.to_u32(),
            ops,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_core::state_space::ExternalOrigin;

    fn sid(i: usize) -> StateID {
        StateID::from(i)
    }

    fn opid(i: usize) -> OpId {
        OpId::from(i)
    }

    #[test]
    fn traces_to_the_true_root_when_fully_local() {
        let mut space = StateSpace::new(8);
        space.open(sid(0), None, None, 0, 0).unwrap();
        space.open(sid(1), Some(sid(0)), Some(opid(0)), 1, 0).unwrap();
        space.open(sid(2), Some(sid(1)), Some(opid(1)), 2, 0).unwrap();
        match trace_local(&space, sid(2)) {
            TraceStep::Root { ops } => assert_eq!(ops, vec![opid(0), opid(1)]),
            TraceStep::External { .. } => panic!("expected a local root"),
        }
    }

    #[test]
    fn stops_at_an_externally_originated_state() {
        let mut space = StateSpace::new(8);
        space.open(sid(0), None, None, 0, 0).unwrap();
        space.set_external_origin(
            sid(0),
            ExternalOrigin {
                sender: 2,
                remote_id: sid(9),
            },
        );
        space.open(sid(1), Some(sid(0)), Some(opid(5)), 1, 0).unwrap();
        match trace_local(&space, sid(1)) {
            TraceStep::External { sender, remote_id, ops } => {
                assert_eq!(sender, 2);
                assert_eq!(remote_id, sid(9));
                assert_eq!(ops, vec![opid(5)]);
            }
            TraceStep::Root { .. } => panic!("expected to stop at the external origin"),
        }
    }
}
