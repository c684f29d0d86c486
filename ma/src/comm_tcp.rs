//! TCP `Comm`: built over a pluggable `Transport` so the framing/dispatch logic stays testable
//! without opening real sockets. `TcpTransport` is the production implementation: one outbound
//! `TcpStream` per peer (dialed lazily) and one reader thread per accepted inbound connection,
//! all funneling decoded messages into a single `crossbeam_channel` the `Comm` impl drains.

use crate::comm::{Comm, CommError};
use crate::message::{self, Message};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Mutex;
use std::time::Duration;

/// What `CommTcp` needs from a byte-level transport: send a framed payload to a peer, and a
/// channel of frames received from anyone. Swappable for tests (`tests::MockTransport`) without
/// touching `CommTcp`'s message-level logic.
pub trait Transport: Send + Sync {
    fn send_frame(&self, peer: u32, frame: &[u8]) -> std::io::Result<()>;
    fn inbound(&self) -> &Receiver<Vec<u8>>;
}

pub struct TcpTransport {
    peer_addrs: Vec<SocketAddr>,
    outbound: Mutex<Vec<Option<TcpStream>>>,
    inbound_rx: Receiver<Vec<u8>>,
    _inbound_tx: Sender<Vec<u8>>,
    _listener: std::thread::JoinHandle<()>,
}

impl TcpTransport {
    /// Binds `peer_addrs[self_id]` and spawns the accept loop. Outbound connections to other
    /// peers are dialed lazily on first send.
    pub fn bind(self_id: u32, peer_addrs: Vec<SocketAddr>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(peer_addrs[self_id as usize])?;
        let (tx, rx) = crossbeam_channel::unbounded();
        let accept_tx = tx.clone();
        let join = std::thread::spawn(move || {
            for conn in listener.incoming() {
                let Ok(stream) = conn else { continue };
                let reader_tx = accept_tx.clone();
                std::thread::spawn(move || {
                    let mut stream = stream;
                    while let Ok(Some(frame)) = message::read_frame(&mut stream) {
                        if reader_tx.send(frame).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        let outbound = (0..peer_addrs.len()).map(|_| None).collect();
        Ok(TcpTransport {
            peer_addrs,
            outbound: Mutex::new(outbound),
            inbound_rx: rx,
            _inbound_tx: tx,
            _listener: join,
        })
    }
}

impl Transport for TcpTransport {
    fn send_frame(&self, peer: u32, frame: &[u8]) -> std::io::Result<()> {
        let mut outbound = self.outbound.lock().unwrap();
        let idx = peer as usize;
        if outbound[idx].is_none() {
            outbound[idx] = Some(TcpStream::connect(self.peer_addrs[idx])?);
        }
        outbound[idx].as_mut().unwrap().write_all(frame)
    }

    fn inbound(&self) -> &Receiver<Vec<u8>> {
        &self.inbound_rx
    }
}

pub struct CommTcp<T: Transport> {
    id: u32,
    num_peers: u32,
    transport: T,
}

impl<T: Transport> CommTcp<T> {
    pub fn new(id: u32, num_peers: u32, transport: T) -> Self {
        CommTcp {
            id,
            num_peers,
            transport,
        }
    }

    fn decode(frame: Vec<u8>) -> Result<Message, CommError> {
        Ok(message::decode(&frame)?)
    }
}

impl<T: Transport> Comm for CommTcp<T> {
    fn id(&self) -> u32 {
        self.id
    }

    fn num_peers(&self) -> u32 {
        self.num_peers
    }

    fn send_to(&self, peer: u32, msg: Message) -> Result<(), CommError> {
        let bytes = message::encode(&msg);
        let framed = message::frame(&bytes);
        self.transport.send_frame(peer, &framed).map_err(CommError::from)
    }

    fn recv(&self) -> Result<Option<Message>, CommError> {
        match self.transport.inbound().try_recv() {
            Ok(frame) => Self::decode(frame).map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(CommError::Closed(self.id)),
        }
    }

    fn recv_block(&self) -> Result<Message, CommError> {
        let frame = self.transport.inbound().recv().map_err(|_| CommError::Closed(self.id))?;
        Self::decode(frame)
    }

    fn recv_block_timeout(&self, timeout: Duration) -> Result<Option<Message>, CommError> {
        match self.transport.inbound().recv_timeout(timeout) {
            Ok(frame) => Self::decode(frame).map(Some),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(CommError::Closed(self.id)),
        }
    }
}
