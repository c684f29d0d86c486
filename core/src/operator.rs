//! Operators: preconditions, (conditional) effects, cost, and multi-agent ownership metadata.

use crate::variable::{AgentMask, Fact};
use plan_collections::create_ref_type;
use plan_collections::ref_store::RefStore;

create_ref_type!(OpId);

/// A conditional effect: `effect` applies only in states that satisfy `condition`.
#[derive(Debug, Clone)]
pub struct ConditionalEffect {
    pub condition: Vec<Fact>,
    pub effect: Vec<Fact>,
}

#[derive(Debug, Clone)]
pub struct Operator {
    pub name: String,
    pub precond: Vec<Fact>,
    pub effects: Vec<Fact>,
    pub cond_effects: Vec<ConditionalEffect>,
    pub cost: u32,
    /// Owning agent, or `None` for a globally-owned (single-agent) operator.
    pub owner: Option<u32>,
    pub owners: AgentMask,
    pub is_private: bool,
}

impl Operator {
    pub fn new(name: impl Into<String>, precond: Vec<Fact>, effects: Vec<Fact>, cost: u32) -> Self {
        Operator {
            name: name.into(),
            precond,
            effects,
            cond_effects: Vec::new(),
            cost,
            owner: None,
            owners: AgentMask::EMPTY,
            is_private: false,
        }
    }

    pub fn with_owner(mut self, agent: u32) -> Self {
        self.owner = Some(agent);
        self.owners.insert(agent);
        self
    }
}

/// Error returned when two conditional effects share an identical condition but disagree on the
/// value they assign to some variable. Per the design notes' resolution of the corresponding
/// open question, such merges are rejected rather than silently resolved by effect order.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("conflicting conditional effects share a condition but assign different values")]
pub struct ConflictingEffects;

/// Merges conditional effects that share an identical condition (by union of their effects),
/// rejecting merges that would assign two different values to the same variable.
pub fn merge_conditional_effects(
    effects: Vec<ConditionalEffect>,
) -> Result<Vec<ConditionalEffect>, ConflictingEffects> {
    let mut merged: Vec<ConditionalEffect> = Vec::new();
    'next: for ce in effects {
        for existing in merged.iter_mut() {
            if existing.condition == ce.condition {
                for fact in &ce.effect {
                    if let Some(prior) = existing.effect.iter().find(|f| f.var == fact.var) {
                        if prior.val != fact.val {
                            return Err(ConflictingEffects);
                        }
                    } else {
                        existing.effect.push(*fact);
                    }
                }
                continue 'next;
            }
        }
        merged.push(ce);
    }
    Ok(merged)
}

/// The full operator table for a problem. Holds every `Operator`, addressed by a dense `OpId`.
#[derive(Default, Debug)]
pub struct Operators {
    ops: RefStore<OpId, Operator>,
}

impl Operators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: Operator) -> OpId {
        self.ops.push(op)
    }

    pub fn get(&self, id: OpId) -> &Operator {
        self.ops.get(id)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = OpId> + '_ {
        self.ops.keys()
    }
}

impl std::ops::Index<OpId> for Operators {
    type Output = Operator;
    fn index(&self, id: OpId) -> &Operator {
        self.get(id)
    }
}
