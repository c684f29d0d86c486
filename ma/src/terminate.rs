//! Ring-based two-phase termination (§4.8): any agent that wants to stop (exhausted its search,
//! or received the final plan) sends `TerminateRequest` around the ring. When the request comes
//! back to its own initiator, every agent has seen it, so the initiator broadcasts
//! `TerminateFinal`. Once a `TerminateRequest` is in flight, non-terminate messages are discarded
//! rather than acted on — the agent is winding down, not searching.

use crate::comm::{Comm, CommError};
use crate::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminatePhase {
    Running,
    /// A `TerminateRequest` for `token` is circulating; this agent has stopped searching.
    Requested { token: u32 },
    Done,
}

#[derive(Debug, Default)]
pub struct Terminate {
    phase: Option<TerminatePhase>,
}

impl Terminate {
    pub fn new() -> Self {
        Terminate { phase: None }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.phase, Some(TerminatePhase::Done))
    }

    pub fn is_winding_down(&self) -> bool {
        self.phase.is_some()
    }

    /// This agent wants to stop: starts a `TerminateRequest` around the ring.
    pub fn request(&mut self, id: u32, token: u32, comm: &impl Comm) -> Result<(), CommError> {
        self.phase = Some(TerminatePhase::Requested { token });
        comm.send_in_ring(Message::TerminateRequest { token, initiator: id })
    }

    /// Handles a received `TerminateRequest`. If it is this agent's own request coming home, the
    /// ring has closed and `TerminateFinal` is broadcast; otherwise it forwards the request on
    /// (adopting the same token, so a second, unrelated request from a different initiator
    /// doesn't get silently dropped while this one is still in flight).
    pub fn handle_request(&mut self, id: u32, token: u32, initiator: u32, comm: &impl Comm) -> Result<(), CommError> {
        if initiator == id {
            comm.send_to_all(Message::TerminateFinal { token })?;
            self.phase = Some(TerminatePhase::Done);
            return Ok(());
        }
        if self.phase.is_none() {
            self.phase = Some(TerminatePhase::Requested { token });
        }
        comm.send_in_ring(Message::TerminateRequest { token, initiator })
    }

    pub fn handle_final(&mut self, _token: u32) {
        self.phase = Some(TerminatePhase::Done);
    }
}
