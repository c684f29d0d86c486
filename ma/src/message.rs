//! Wire schema for inter-agent messages: a one-byte tag, a 4-byte header word whose top bit
//! records the sender's native endianness, then the fixed fields in declaration order, with any
//! array preceded by a 32-bit little-endian length — mirrors the original's per-field schema
//! encoder (`msg_schema.c`), simplified from a generic reflective schema to one hand-written
//! encode/decode pair per message variant since Rust's enum already gives us the tagging that
//! schema's bitmask-of-present-fields was emulating in C.

use std::io;

const ENDIAN_BIT: u32 = 1 << 31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    PublicState(PublicState),
    TracePath(TracePath),
    /// Both the initial broadcast and every ring hop of the `Mark` propagation (§4.8): a peer
    /// seeing a given `token` for the first time records its local bound and forwards this same
    /// message around the ring; seeing it a second time means the ring has closed for that peer.
    SnapshotInit { token: u32, cost: u32, initiator: u32 },
    SnapshotResponse { token: u32, from: u32, lowest: u32 },
    SnapshotFinal { token: u32, cost: u32 },
    TerminateRequest { token: u32, initiator: u32 },
    TerminateFinal { token: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicState {
    pub sender: u32,
    pub remote_id: u32,
    pub g: u32,
    pub h: u32,
    pub public_words: Vec<u64>,
}

/// A plan prefix under construction as it is handed backward from agent to agent during path
/// tracing (§4.8): `ops` accumulates in trace order (goal-ward first), and `origin` names the
/// agent whose local operator ids `ops` are expressed in for the segment most recently appended.
/// `resume_state` is the receiving agent's own `StateID` for the public state that was originally
/// sent to `origin` — the local id to resume `trace_local` from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracePath {
    pub token: u32,
    pub origin: u32,
    pub resume_state: u32,
    pub ops: Vec<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("message buffer truncated")]
    Truncated,
    #[error("unknown message tag {0}")]
    UnknownTag(u8),
}

fn host_is_little_endian() -> bool {
    1u32.to_ne_bytes()[0] == 1
}

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn new(tag: u8) -> Self {
        let mut buf = Vec::new();
        buf.push(tag);
        let mut header = 0u32;
        if host_is_little_endian() {
            header |= ENDIAN_BIT;
        }
        buf.extend_from_slice(&header.to_ne_bytes());
        Writer { buf }
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_ne_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_ne_bytes());
    }

    fn arr_u64(&mut self, items: &[u64]) {
        self.buf.extend_from_slice(&(items.len() as u32).to_le_bytes());
        for &item in items {
            self.u64(item);
        }
    }

    fn arr_u32(&mut self, items: &[u32]) {
        self.buf.extend_from_slice(&(items.len() as u32).to_le_bytes());
        for &item in items {
            self.u32(item);
        }
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    swap: bool,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Result<(u8, Self), CodecError> {
        if buf.len() < 5 {
            return Err(CodecError::Truncated);
        }
        let tag = buf[0];
        let header = u32::from_ne_bytes(buf[1..5].try_into().unwrap());
        let sender_was_little = header & ENDIAN_BIT != 0;
        let swap = sender_was_little != host_is_little_endian();
        Ok((
            tag,
            Reader {
                buf: &buf[5..],
                pos: 0,
                swap,
            },
        ))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.pos + n > self.buf.len() {
            return Err(CodecError::Truncated);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().unwrap();
        let v = u32::from_ne_bytes(bytes);
        Ok(if self.swap { v.swap_bytes() } else { v })
    }

    fn u64(&mut self) -> Result<u64, CodecError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().unwrap();
        let v = u64::from_ne_bytes(bytes);
        Ok(if self.swap { v.swap_bytes() } else { v })
    }

    fn arr_len(&mut self) -> Result<usize, CodecError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().unwrap();
        Ok(u32::from_le_bytes(bytes) as usize)
    }

    fn arr_u64(&mut self) -> Result<Vec<u64>, CodecError> {
        let len = self.arr_len()?;
        (0..len).map(|_| self.u64()).collect()
    }

    fn arr_u32(&mut self) -> Result<Vec<u32>, CodecError> {
        let len = self.arr_len()?;
        (0..len).map(|_| self.u32()).collect()
    }
}

const TAG_PUBLIC_STATE: u8 = 0;
const TAG_TRACE_PATH: u8 = 1;
const TAG_SNAPSHOT_INIT: u8 = 2;
const TAG_SNAPSHOT_RESPONSE: u8 = 4;
const TAG_SNAPSHOT_FINAL: u8 = 5;
const TAG_TERMINATE_REQUEST: u8 = 6;
const TAG_TERMINATE_FINAL: u8 = 7;

pub fn encode(msg: &Message) -> Vec<u8> {
    match msg {
        Message::PublicState(s) => {
            let mut w = Writer::new(TAG_PUBLIC_STATE);
            w.u32(s.sender);
            w.u32(s.remote_id);
            w.u32(s.g);
            w.u32(s.h);
            w.arr_u64(&s.public_words);
            w.finish()
        }
        Message::TracePath(t) => {
            let mut w = Writer::new(TAG_TRACE_PATH);
            w.u32(t.token);
            w.u32(t.origin);
            w.u32(t.resume_state);
            w.arr_u32(&t.ops);
            w.finish()
        }
        Message::SnapshotInit { token, cost, initiator } => {
            let mut w = Writer::new(TAG_SNAPSHOT_INIT);
            w.u32(*token);
            w.u32(*cost);
            w.u32(*initiator);
            w.finish()
        }
        Message::SnapshotResponse { token, from, lowest } => {
            let mut w = Writer::new(TAG_SNAPSHOT_RESPONSE);
            w.u32(*token);
            w.u32(*from);
            w.u32(*lowest);
            w.finish()
        }
        Message::SnapshotFinal { token, cost } => {
            let mut w = Writer::new(TAG_SNAPSHOT_FINAL);
            w.u32(*token);
            w.u32(*cost);
            w.finish()
        }
        Message::TerminateRequest { token, initiator } => {
            let mut w = Writer::new(TAG_TERMINATE_REQUEST);
            w.u32(*token);
            w.u32(*initiator);
            w.finish()
        }
        Message::TerminateFinal { token } => {
            let mut w = Writer::new(TAG_TERMINATE_FINAL);
            w.u32(*token);
            w.finish()
        }
    }
}

pub fn decode(buf: &[u8]) -> Result<Message, CodecError> {
    let (tag, mut r) = Reader::new(buf)?;
    Ok(match tag {
        TAG_PUBLIC_STATE => Message::PublicState(PublicState {
            sender: r.u32()?,
            remote_id: r.u32()?,
            g: r.u32()?,
            h: r.u32()?,
            public_words: r.arr_u64()?,
        }),
        TAG_TRACE_PATH => Message::TracePath(TracePath {
            token: r.u32()?,
            origin: r.u32()?,
            resume_state: r.u32()?,
            ops: r.arr_u32()?,
        }),
        TAG_SNAPSHOT_INIT => Message::SnapshotInit {
            token: r.u32()?,
            cost: r.u32()?,
            initiator: r.u32()?,
        },
        TAG_SNAPSHOT_RESPONSE => Message::SnapshotResponse {
            token: r.u32()?,
            from: r.u32()?,
            lowest: r.u32()?,
        },
        TAG_SNAPSHOT_FINAL => Message::SnapshotFinal {
            token: r.u32()?,
            cost: r.u32()?,
        },
        TAG_TERMINATE_REQUEST => Message::TerminateRequest {
            token: r.u32()?,
            initiator: r.u32()?,
        },
        TAG_TERMINATE_FINAL => Message::TerminateFinal { token: r.u32()? },
        other => return Err(CodecError::UnknownTag(other)),
    })
}

/// Frames `bytes` for a stream transport: a 4-byte little-endian length prefix followed by the
/// payload, so a reader never needs to guess where one message ends and the next begins.
pub fn frame(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + bytes.len());
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
    out
}

/// Reads one length-prefixed frame from `reader`, or `Ok(None)` on a clean EOF before any bytes
/// of the next frame arrive.
pub fn read_frame<R: io::Read>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(Some(payload))
}
