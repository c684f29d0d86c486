//! Per-agent heuristic operator scope (§4.8's open question on what an agent's heuristic should
//! see): `expand()` always uses the full successor generator so search stays sound, but the
//! *heuristic estimate* can be computed over a narrower operator set to keep it cheap and to
//! avoid leaking other agents' private actions into this agent's guidance.
//!
//! - `Global`: every operator in the problem, exactly like single-agent search.
//! - `Projected`: only operators this agent owns or that are public (empty `owners`, or a
//!   shared/global operator) — i.e. what this agent could plausibly reason about without peeking
//!   at another agent's private operators.
//! - `Local`: only operators this agent itself owns.

use plan_core::Operators;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeurScope {
    Global,
    Projected,
    Local,
}

/// Builds the operator table a heuristic should be evaluated against for `agent` under `scope`.
/// `expand()` is never driven from this table; only `Heuristic::evaluate` is.
pub fn scoped_ops(ops: &Operators, agent: u32, scope: HeurScope) -> Operators {
    let mut scoped = Operators::new();
    for id in ops.iter() {
        let op = ops.get(id);
        let visible = match scope {
            HeurScope::Global => true,
            HeurScope::Projected => op.owners.is_empty() || op.owners.contains(agent),
            HeurScope::Local => op.owner == Some(agent),
        };
        if visible {
            scoped.push(op.clone());
        }
    }
    scoped
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_core::{AgentMask, Fact, Operator, VarId};

    fn fact(v: usize, val: u32) -> Fact {
        Fact::new(VarId::from(v), val)
    }

    fn sample() -> Operators {
        let mut ops = Operators::new();
        ops.push(Operator::new("public", vec![fact(0, 0)], vec![fact(0, 1)], 1));
        ops.push(Operator::new("mine", vec![fact(0, 1)], vec![fact(0, 2)], 1).with_owner(0));
        let mut theirs = Operator::new("theirs", vec![fact(0, 2)], vec![fact(0, 3)], 1).with_owner(1);
        theirs.owners = AgentMask::EMPTY;
        theirs.owners.insert(1);
        ops.push(theirs);
        ops
    }

    #[test]
    fn global_keeps_everything() {
        let ops = sample();
        let scoped = scoped_ops(&ops, 0, HeurScope::Global);
        assert_eq!(scoped.len(), 3);
    }

    #[test]
    fn local_keeps_only_own_operators() {
        let ops = sample();
        let scoped = scoped_ops(&ops, 0, HeurScope::Local);
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped.get(scoped.iter().next().unwrap()).name, "mine");
    }

    #[test]
    fn projected_drops_other_agents_private_operators() {
        let ops = sample();
        let scoped = scoped_ops(&ops, 0, HeurScope::Projected);
        let names: Vec<_> = scoped.iter().map(|id| scoped.get(id).name.clone()).collect();
        assert_eq!(names, vec!["public", "mine"]);
    }
}
