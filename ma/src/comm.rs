//! The `Comm` trait every multi-agent search thread drives through, abstracting over the
//! in-process (`comm_queue`) and TCP (`comm_tcp`) transports.

use crate::message::Message;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CommError {
    #[error("peer {0} is gone")]
    Closed(u32),
    #[error("receive timed out")]
    Timeout,
    #[error("message codec error: {0}")]
    Codec(#[from] crate::message::CodecError),
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait Comm {
    /// This agent's own id, `0..num_peers()`.
    fn id(&self) -> u32;

    /// Number of agents in the cooperating set, including this one.
    fn num_peers(&self) -> u32;

    fn send_to(&self, peer: u32, msg: Message) -> Result<(), CommError>;

    fn send_to_all(&self, msg: Message) -> Result<(), CommError> {
        for peer in 0..self.num_peers() {
            if peer != self.id() {
                self.send_to(peer, msg.clone())?;
            }
        }
        Ok(())
    }

    /// Sends to `(self.id() + 1) % num_peers()`, the next agent in the termination/snapshot ring.
    fn send_in_ring(&self, msg: Message) -> Result<(), CommError> {
        let next = (self.id() + 1) % self.num_peers();
        self.send_to(next, msg)
    }

    /// Non-blocking: `Ok(None)` if nothing is queued right now.
    fn recv(&self) -> Result<Option<Message>, CommError>;

    fn recv_block(&self) -> Result<Message, CommError>;

    fn recv_block_timeout(&self, timeout: Duration) -> Result<Option<Message>, CommError>;
}
