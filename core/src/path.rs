//! Solution plan reconstruction: walk parent pointers back from a goal state to the initial
//! state and reverse.

use crate::operator::OpId;
use crate::state::StateID;
use crate::state_space::StateSpace;

/// A plan: an ordered sequence of (state reached, operator applied to reach the *next* state)
/// pairs, plus the final state. `steps[i].1` is `None` only for the very last entry, which
/// records the goal state with no further operator.
#[derive(Debug, Clone)]
pub struct Path {
    pub states: Vec<StateID>,
    pub ops: Vec<OpId>,
}

impl Path {
    pub fn cost(&self, ops: &crate::operator::Operators) -> u32 {
        self.ops.iter().map(|&id| ops.get(id).cost).sum()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Walks `space`'s parent pointers from `goal` back to a root (a node with no parent), then
/// reverses the result so it reads initial-state-first.
pub fn reconstruct(space: &StateSpace, goal: StateID) -> Path {
    let mut states = vec![goal];
    let mut ops = Vec::new();
    let mut current = goal;
    while let Some(node) = space.get(current) {
        match (node.parent, node.generating_op) {
            (Some(parent), Some(op)) => {
                states.push(parent);
                ops.push(op);
                current = parent;
            }
            _ => break,
        }
    }
    states.reverse();
    ops.reverse();
    Path { states, ops }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{Operator, Operators};

    fn sid(i: usize) -> StateID {
        StateID::from(i)
    }

    #[test]
    fn reconstructs_chain_in_forward_order() {
        let mut space = StateSpace::new(8);
        let mut ops = Operators::new();
        let op0 = ops.push(Operator::new("op0", vec![], vec![], 1));
        let op1 = ops.push(Operator::new("op1", vec![], vec![], 1));

        space.open(sid(0), None, None, 0, 0).unwrap();
        space.open(sid(1), Some(sid(0)), Some(op0), 1, 0).unwrap();
        space.open(sid(2), Some(sid(1)), Some(op1), 2, 0).unwrap();

        let path = reconstruct(&space, sid(2));
        assert_eq!(path.states, vec![sid(0), sid(1), sid(2)]);
        assert_eq!(path.ops, vec![op0, op1]);
        assert_eq!(path.cost(&ops), 2);
    }

    #[test]
    fn single_state_path_has_no_ops() {
        let mut space = StateSpace::new(8);
        space.open(sid(0), None, None, 0, 0).unwrap();
        let path = reconstruct(&space, sid(0));
        assert_eq!(path.states, vec![sid(0)]);
        assert!(path.is_empty());
    }
}
