//! Hash-consed store of packed states, addressed by dense `StateID`s.

use crate::packer::StatePacker;
use crate::state::{MaskedBuffer, PackedState, StateID};
use plan_collections::segmented::{AttributeArray, SegmentedArray};
use std::collections::hash_map::DefaultHasher;
use std::hash::{BuildHasherDefault, Hash, Hasher};

/// A fast, non-cryptographic 64-bit mixing hash over a packed state's words. Collisions are
/// resolved by `hashbrown`'s own probing plus the `Eq` comparison on `PackedState`, so this only
/// needs to mix bits well, not be secure.
#[derive(Default)]
pub struct WordMixHasher(u64);

impl Hasher for WordMixHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        // Packed states are always hashed word-at-a-time via `write_u64`; this fallback keeps
        // the hasher usable for anything else that ends up sharing the build hasher.
        let mut h = DefaultHasher::new();
        bytes.hash(&mut h);
        self.0 ^= h.finish();
    }

    fn write_u64(&mut self, word: u64) {
        // Splitmix64-style mixing step.
        let mut z = self.0.wrapping_add(word).wrapping_add(0x9E3779B97F4A7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        self.0 = z ^ (z >> 31);
    }
}

type StateMap = hashbrown::HashMap<PackedState, StateID, BuildHasherDefault<WordMixHasher>>;

/// Hash-consed set of packed states. Owns the `StatePacker` it was built from and the segmented
/// backing store every packed buffer lives in; every other component only ever holds a
/// `StateID`.
pub struct StatePool {
    packer: StatePacker,
    states: SegmentedArray<PackedState>,
    index: StateMap,
    segment_size: usize,
}

impl StatePool {
    pub fn new(packer: StatePacker) -> Self {
        let segment_size = plan_env_param::SEGMENT_SIZE.get();
        StatePool {
            packer,
            states: SegmentedArray::new(segment_size),
            index: StateMap::default(),
            segment_size,
        }
    }

    pub fn packer(&self) -> &StatePacker {
        &self.packer
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Allocates a typed, lazily-initialized parallel array over this pool's `StateID` space.
    pub fn new_attribute<T: Clone>(&self) -> AttributeArray<T> {
        AttributeArray::new(self.segment_size)
    }

    /// Inserts `state`, returning its existing id if an equal buffer was already present.
    pub fn insert(&mut self, state: PackedState) -> StateID {
        if let Some(&id) = self.index.get(&state) {
            return id;
        }
        let idx = self.states.push(state.clone());
        let id = StateID::from(idx);
        self.index.insert(state, id);
        id
    }

    pub fn insert_values(&mut self, values: &[u32]) -> StateID {
        self.insert(self.packer.pack(values))
    }

    /// Non-inserting lookup.
    pub fn find(&self, state: &PackedState) -> Option<StateID> {
        self.index.get(state).copied()
    }

    pub fn get_packed(&self, id: StateID) -> &PackedState {
        self.states.get(usize::from(id))
    }

    pub fn get_values(&self, id: StateID) -> Vec<u32> {
        self.packer.unpack(self.get_packed(id))
    }

    /// `new = (old & ~mask) | val`, inserted and returned as a `StateID`.
    pub fn apply_partial(&mut self, partial: &MaskedBuffer, id: StateID) -> StateID {
        let applied = partial.apply_to(self.get_packed(id));
        self.insert(applied)
    }

    pub fn apply_partials(&mut self, partials: &[MaskedBuffer], id: StateID) -> StateID {
        partials.iter().fold(id, |acc, p| self.apply_partial(p, acc))
    }
}
