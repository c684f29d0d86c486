//! Lazy open lists: an entry is pushed with a priority key and popped in priority order, but
//! nothing is done to keep stale entries (a state re-inserted at a better `g`, or already closed)
//! out — the search kernel re-checks a popped entry's state-space status before using it. This
//! lets the list itself stay a dumb, swappable container; `--search {fifo|bucket|heap|rbtree|
//! splaytree}` only changes its internal backend.

use crate::priority::BucketQueue;
use plan_core::{OpId, StateID};
use std::collections::{BTreeMap, BinaryHeap, VecDeque};

#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub state: StateID,
    pub parent: Option<StateID>,
    pub op: Option<OpId>,
    pub g: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Fifo,
    Bucket,
    Heap,
    RbTree,
    SplayTree,
}

struct HeapItem {
    key: i64,
    seq: u64,
    entry: Entry,
}
impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.seq == other.seq
    }
}
impl Eq for HeapItem {}
impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.key.cmp(&self.key).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Tie-break ordering used by every non-FIFO backend: primary key first, then lexicographic
/// `(g, state id)` so equal-key entries still pop in a fixed, reproducible order instead of
/// whatever each backend's internal layout happens to prefer.
fn tie_break_key(key: u32, entry: &Entry) -> (u32, u32, u32) {
    (key, entry.g, entry.state.to_u32())
}

pub struct LazyOpenList {
    backend: Backend,
    fifo: VecDeque<Entry>,
    bucket: BucketQueue<Entry>,
    heap: BinaryHeap<HeapItem>,
    // Ordered map keyed by the lexicographic tie-break tuple; used for both `rbtree` and
    // `splaytree`. See the design notes: a literal self-adjusting splay tree isn't grounded in
    // anything in this corpus, and `BTreeMap` already gives the ordered-pop contract the `--search
    // splaytree` flag asks for.
    ordered: BTreeMap<(u32, u32, u32), Entry>,
    next_seq: u64,
    len: usize,
}

impl LazyOpenList {
    pub fn new(backend: Backend) -> Self {
        LazyOpenList {
            backend,
            fifo: VecDeque::new(),
            bucket: BucketQueue::new(),
            heap: BinaryHeap::new(),
            ordered: BTreeMap::new(),
            next_seq: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, key: u32, entry: Entry) {
        self.len += 1;
        match self.backend {
            Backend::Fifo => self.fifo.push_back(entry),
            Backend::Bucket => self.bucket.push(key, entry),
            Backend::Heap => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.heap.push(HeapItem {
                    key: key as i64,
                    seq,
                    entry,
                });
            }
            Backend::RbTree | Backend::SplayTree => {
                self.ordered.insert(tie_break_key(key, &entry), entry);
            }
        }
    }

    pub fn pop(&mut self) -> Option<Entry> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        match self.backend {
            Backend::Fifo => self.fifo.pop_front(),
            Backend::Bucket => self.bucket.pop().map(|(_, e)| e),
            Backend::Heap => self.heap.pop().map(|h| h.entry),
            Backend::RbTree | Backend::SplayTree => {
                let key = *self.ordered.keys().next()?;
                self.ordered.remove(&key)
            }
        }
    }
}
