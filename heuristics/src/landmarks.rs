//! Shared cache of disjunctive action landmarks (sets of operators of which a plan must include
//! at least one), keyed by a dense id so the flow heuristic's optional LM-Cut rows and repeated
//! LM-Cut evaluations on related states can reuse sets already extracted elsewhere.

use plan_collections::create_ref_type;
use plan_collections::ref_store::RefStore;
use plan_core::OpId;

create_ref_type!(LandmarkId);

#[derive(Default)]
pub struct LandmarkCache {
    sets: RefStore<LandmarkId, Vec<OpId>>,
}

impl LandmarkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut landmark: Vec<OpId>) -> LandmarkId {
        landmark.sort_by_key(|op| op.to_u32());
        landmark.dedup();
        self.sets.push(landmark)
    }

    pub fn get(&self, id: LandmarkId) -> &[OpId] {
        self.sets.get(id)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkId, &[OpId])> {
        self.sets.entries().map(|(id, v)| (id, v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_normalizes_order_and_duplicates() {
        let mut cache = LandmarkCache::new();
        let id = cache.insert(vec![OpId::from(2usize), OpId::from(0usize), OpId::from(2usize)]);
        assert_eq!(cache.get(id), &[OpId::from(0usize), OpId::from(2usize)]);
        assert_eq!(cache.len(), 1);
    }
}
