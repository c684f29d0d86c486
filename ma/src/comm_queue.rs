//! In-process `Comm`: one bounded inbound queue per agent, with every other agent holding a
//! cloned `Sender` into it — directly mirrors the teacher's `Synchro`/`InputStream` pattern
//! (`solver/src/signals.rs`) and the original's pool-of-queues design
//! (`ma_comm_queue.h`: one queue per node, shared by every sender, rather than one channel per
//! ordered peer pair).

use crate::comm::{Comm, CommError};
use crate::message::Message;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

pub struct CommQueue {
    id: u32,
    senders: Vec<Sender<Message>>,
    receiver: Receiver<Message>,
}

/// Builds one bounded channel per agent and wires every sender to every other agent's queue.
pub fn build_pool(num_agents: u32) -> Vec<CommQueue> {
    let capacity = plan_env_param::MA_CHANNEL_CAPACITY.get();
    let mut senders = Vec::with_capacity(num_agents as usize);
    let mut receivers = Vec::with_capacity(num_agents as usize);
    for _ in 0..num_agents {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        senders.push(tx);
        receivers.push(rx);
    }
    receivers
        .into_iter()
        .enumerate()
        .map(|(id, receiver)| CommQueue {
            id: id as u32,
            senders: senders.clone(),
            receiver,
        })
        .collect()
}

impl Comm for CommQueue {
    fn id(&self) -> u32 {
        self.id
    }

    fn num_peers(&self) -> u32 {
        self.senders.len() as u32
    }

    fn send_to(&self, peer: u32, msg: Message) -> Result<(), CommError> {
        self.senders[peer as usize].send(msg).map_err(|_| CommError::Closed(peer))
    }

    fn recv(&self) -> Result<Option<Message>, CommError> {
        match self.receiver.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(CommError::Closed(self.id)),
        }
    }

    fn recv_block(&self) -> Result<Message, CommError> {
        self.receiver.recv().map_err(|_| CommError::Closed(self.id))
    }

    fn recv_block_timeout(&self, timeout: Duration) -> Result<Option<Message>, CommError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(msg) => Ok(Some(msg)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(CommError::Closed(self.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn send_to_and_recv_delivers_in_order() {
        let pool = build_pool(3);
        pool[0].send_to(1, Message::TerminateFinal { token: 1 }).unwrap();
        pool[0].send_to(1, Message::TerminateFinal { token: 2 }).unwrap();
        assert_eq!(pool[1].recv().unwrap(), Some(Message::TerminateFinal { token: 1 }));
        assert_eq!(pool[1].recv().unwrap(), Some(Message::TerminateFinal { token: 2 }));
        assert_eq!(pool[1].recv().unwrap(), None);
    }

    #[test]
    fn send_to_all_skips_self() {
        let pool = build_pool(3);
        pool[0].send_to_all(Message::TerminateFinal { token: 1 }).unwrap();
        assert!(pool[1].recv().unwrap().is_some());
        assert!(pool[2].recv().unwrap().is_some());
        assert_eq!(pool[0].recv().unwrap(), None);
    }

    #[test]
    fn send_in_ring_wraps_around() {
        let pool = build_pool(3);
        pool[2].send_in_ring(Message::TerminateFinal { token: 1 }).unwrap();
        assert!(pool[0].recv().unwrap().is_some());
        assert_eq!(pool[1].recv().unwrap(), None);
    }

    #[test]
    fn recv_block_timeout_expires_without_a_message() {
        let pool = build_pool(2);
        assert_eq!(pool[0].recv_block_timeout(Duration::from_millis(10)).unwrap(), None);
    }
}
