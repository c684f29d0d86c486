//! Successor generator: a decision tree over precondition variables that, given a state, yields
//! every operator whose precondition it satisfies without scanning the whole operator table.

use crate::operator::{OpId, Operators};
use crate::packer::StatePacker;
use crate::variable::{Fact, VarId, VarSet};

/// One node of the tree. An internal node tests `var`; `children[val]` holds the subtree for
/// states where `var == val`, and `default` holds operators/subtrees unconstrained on `var`
/// (i.e. operators whose precondition never mentions it, which must be considered regardless of
/// `var`'s value).
enum Node {
    Leaf(Vec<OpId>),
    Switch {
        var: VarId,
        children: Vec<Option<Box<Node>>>,
        default: Box<Node>,
    },
}

pub struct SuccessorGenerator {
    root: Node,
}

impl SuccessorGenerator {
    pub fn build(vars: &VarSet, ops: &Operators) -> Self {
        let all: Vec<OpId> = ops.iter().collect();
        let root = build_node(vars, ops, &all, 0);
        SuccessorGenerator { root }
    }

    /// Appends every operator whose precondition `state_values` satisfies into `out`.
    pub fn find(&self, state_values: &[u32], out: &mut Vec<OpId>) -> usize {
        let start = out.len();
        collect(&self.root, state_values, out);
        out.len() - start
    }

    pub fn find_packed(&self, packer: &StatePacker, state: &crate::state::PackedState, out: &mut Vec<OpId>) -> usize {
        let values = packer.unpack(state);
        self.find(&values, out)
    }
}

fn collect(node: &Node, state_values: &[u32], out: &mut Vec<OpId>) {
    match node {
        Node::Leaf(ops) => out.extend(ops.iter().copied()),
        Node::Switch { var, children, default } => {
            let val = state_values[usize::from(*var)] as usize;
            if let Some(Some(child)) = children.get(val) {
                collect(child, state_values, out);
            }
            collect(default, state_values, out);
        }
    }
}

/// Splits `op_ids` on the first variable (by ascending `VarId`, starting the scan at
/// `from_var`) any of them constrains, recursing on both the per-value partitions and the
/// "doesn't mention this variable" default partition. Operators whose precondition is uniform
/// across every remaining variable (including "mentions none of them") bottom out in a `Leaf`.
fn build_node(vars: &VarSet, ops: &Operators, op_ids: &[OpId], from_var: usize) -> Node {
    let num_vars = vars.len();
    let mut var = from_var;
    while var < num_vars {
        let v = VarId::from(var);
        let constrained: Vec<(OpId, u32)> = op_ids
            .iter()
            .filter_map(|&id| precond_value(ops, id, v).map(|val| (id, val)))
            .collect();
        if !constrained.is_empty() {
            let range = vars[v].range as usize;
            let mut children: Vec<Vec<OpId>> = vec![Vec::new(); range];
            for (id, val) in &constrained {
                children[*val as usize].push(*id);
            }
            let constrained_ids: std::collections::HashSet<OpId> =
                constrained.iter().map(|(id, _)| *id).collect();
            let default_ids: Vec<OpId> =
                op_ids.iter().copied().filter(|id| !constrained_ids.contains(id)).collect();

            let children = children
                .into_iter()
                .map(|group| {
                    if group.is_empty() {
                        None
                    } else {
                        Some(Box::new(build_node(vars, ops, &group, var + 1)))
                    }
                })
                .collect();
            let default = Box::new(build_node(vars, ops, &default_ids, var + 1));
            return Node::Switch { var: v, children, default };
        }
        var += 1;
    }
    Node::Leaf(op_ids.to_vec())
}

fn precond_value(ops: &Operators, id: OpId, var: VarId) -> Option<u32> {
    ops.get(id).precond.iter().find(|f: &&Fact| f.var == var).map(|f| f.val)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Operator;
    use crate::variable::{Fact, Variable};

    fn fact(v: usize, val: u32) -> Fact {
        Fact::new(VarId::from(v), val)
    }

    fn setup() -> (VarSet, Operators) {
        let mut vars = VarSet::new();
        vars.push(Variable::new("a", 3));
        vars.push(Variable::new("b", 2));
        let mut ops = Operators::new();
        // op0: a=0
        ops.push(Operator::new("op0", vec![fact(0, 0)], vec![], 1));
        // op1: a=1, b=0
        ops.push(Operator::new("op1", vec![fact(0, 1), fact(1, 0)], vec![], 1));
        // op2: unconstrained (applicable everywhere)
        ops.push(Operator::new("op2", vec![], vec![], 1));
        (vars, ops)
    }

    #[test]
    fn finds_applicable_operators_only() {
        let (vars, ops) = setup();
        let gen = SuccessorGenerator::build(&vars, &ops);

        let mut out = Vec::new();
        gen.find(&[0, 0], &mut out);
        assert_eq!(out.len(), 2); // op0, op2
        assert!(out.contains(&OpId::from(0usize)));
        assert!(out.contains(&OpId::from(2usize)));

        out.clear();
        gen.find(&[1, 0], &mut out);
        assert_eq!(out.len(), 2); // op1, op2
        assert!(out.contains(&OpId::from(1usize)));

        out.clear();
        gen.find(&[1, 1], &mut out);
        assert_eq!(out.len(), 1); // op2 only
        assert_eq!(out[0], OpId::from(2usize));

        out.clear();
        gen.find(&[2, 0], &mut out);
        assert_eq!(out.len(), 1); // op2 only
    }

    #[test]
    fn empty_operator_set_yields_nothing() {
        let mut vars = VarSet::new();
        vars.push(Variable::new("a", 2));
        let ops = Operators::new();
        let gen = SuccessorGenerator::build(&vars, &ops);
        let mut out = Vec::new();
        gen.find(&[0], &mut out);
        assert!(out.is_empty());
    }
}
