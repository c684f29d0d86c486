//! Dense fact numbering shared by every relaxation-based heuristic: fact `(var, val)` maps to a
//! single `usize` so relaxation bookkeeping can live in plain `Vec`s instead of hashing `Fact`s.

use plan_core::{Fact, VarId, VarSet};

pub struct FactIndex {
    offsets: Vec<usize>,
    num_facts: usize,
}

impl FactIndex {
    pub fn build(vars: &VarSet) -> Self {
        let mut offsets = Vec::with_capacity(vars.len());
        let mut acc = 0usize;
        for (_, v) in vars.iter() {
            offsets.push(acc);
            acc += v.range as usize;
        }
        FactIndex {
            offsets,
            num_facts: acc,
        }
    }

    pub fn num_facts(&self) -> usize {
        self.num_facts
    }

    pub fn id(&self, fact: Fact) -> usize {
        self.offsets[usize::from(fact.var)] + fact.val as usize
    }

    pub fn var_of(&self, fact_id: usize) -> VarId {
        match self.offsets.binary_search(&fact_id) {
            Ok(i) => VarId::from(i),
            Err(i) => VarId::from(i - 1),
        }
    }

    /// The fact ids true in a fully-assigned state.
    pub fn state_facts(&self, values: &[u32]) -> Vec<usize> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| self.offsets[i] + v as usize)
            .collect()
    }
}
