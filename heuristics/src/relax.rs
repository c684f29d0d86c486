//! Delete-relaxation heuristics (hadd, hmax, hff): a flag-driven fixed-point sweep over
//! operators, generalizing the teacher's `hadd` (which hard-codes the additive combination) with
//! a pluggable `Combine` so hmax shares the same loop.

use crate::facts::FactIndex;
use plan_core::{OpId, Operators, VarSet};

const INF: f64 = f64::INFINITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// hadd: precondition cost is the sum of its facts' costs.
    Sum,
    /// hmax: precondition cost is the max of its facts' costs.
    Max,
}

impl Combine {
    fn combine(self, costs: impl Iterator<Item = f64>) -> f64 {
        match self {
            Combine::Sum => costs.sum(),
            Combine::Max => costs.fold(0.0, f64::max),
        }
    }
}

pub struct RelaxResult {
    pub op_cost: Vec<f64>,
    pub fact_cost: Vec<f64>,
    /// The operator last used to improve each fact's cost, i.e. its relaxed-plan supporter.
    pub supporter: Vec<Option<OpId>>,
}

impl RelaxResult {
    pub fn goal_cost(&self, combine: Combine, facts: &FactIndex, goal: &[plan_core::Fact]) -> f64 {
        combine.combine(goal.iter().map(|f| self.fact_cost[facts.id(*f)]))
    }
}

/// Runs the fixed point. Operators are re-examined whenever one of the facts they depend on
/// (precondition facts for recomputing the operator's own cost, or any fact for the "does an
/// achieved fact feed this operator" dependency) improves, mirroring the teacher's `update`
/// flag array plus `dependent_on` adjacency.
pub fn relax(combine: Combine, facts: &FactIndex, ops: &Operators, state_values: &[u32]) -> RelaxResult {
    let num_ops = ops.len();
    let num_facts = facts.num_facts();

    let mut op_cost = vec![INF; num_ops];
    let mut fact_cost = vec![INF; num_facts];
    let mut supporter: Vec<Option<OpId>> = vec![None; num_facts];
    let mut update = vec![false; num_ops];

    // dependents[p] = operators whose precondition mentions fact p.
    let mut dependents: Vec<Vec<OpId>> = vec![Vec::new(); num_facts];
    for op in ops.iter() {
        for f in &ops.get(op).precond {
            dependents[facts.id(*f)].push(op);
        }
        if ops.get(op).precond.is_empty() {
            update[usize::from(op)] = true;
        }
    }

    for (i, &val) in state_values.iter().enumerate() {
        let fid = facts.id(plan_core::Fact::new(plan_core::VarId::from(i), val));
        fact_cost[fid] = 0.0;
        for &dep in &dependents[fid] {
            update[usize::from(dep)] = true;
        }
    }

    let mut again = true;
    while again {
        again = false;
        for op in ops.iter() {
            let oi = usize::from(op);
            if !update[oi] {
                continue;
            }
            update[oi] = false;
            let precond = &ops.get(op).precond;
            let c = combine.combine(precond.iter().map(|f| fact_cost[facts.id(*f)]));
            if c < op_cost[oi] {
                op_cost[oi] = c;
                for eff in &ops.get(op).effects {
                    let fid = facts.id(*eff);
                    let new_cost = c + ops.get(op).cost as f64;
                    if new_cost < fact_cost[fid] {
                        fact_cost[fid] = new_cost;
                        supporter[fid] = Some(op);
                        for &dep in &dependents[fid] {
                            update[usize::from(dep)] = true;
                        }
                        again = true;
                    }
                }
            }
        }
    }

    RelaxResult {
        op_cost,
        fact_cost,
        supporter,
    }
}

/// Backward-chains from the goal facts through `supporter` pointers to extract the relaxed plan,
/// then returns the operators on it that are applicable in the current state (cost 0 precondition
/// under the same relaxation) as the preferred-operator set for `hff`.
pub fn relaxed_plan_preferred_ops(
    facts: &FactIndex,
    ops: &Operators,
    result: &RelaxResult,
    goal: &[plan_core::Fact],
    state_values: &[u32],
) -> Vec<OpId> {
    let mut needed = std::collections::HashSet::new();
    let mut stack: Vec<usize> = goal.iter().map(|f| facts.id(*f)).collect();
    let mut plan_ops = Vec::new();
    let mut seen_facts = std::collections::HashSet::new();

    while let Some(fid) = stack.pop() {
        if !seen_facts.insert(fid) {
            continue;
        }
        if result.fact_cost[fid] == 0.0 {
            continue; // already true in the current state
        }
        if let Some(op) = result.supporter[fid] {
            if needed.insert(op) {
                plan_ops.push(op);
                for f in &ops.get(op).precond {
                    stack.push(facts.id(*f));
                }
            }
        }
    }

    plan_ops
        .into_iter()
        .filter(|&op| {
            ops.get(op)
                .precond
                .iter()
                .all(|f| state_values[usize::from(f.var)] == f.val)
        })
        .collect()
}

pub fn hadd(vars: &VarSet, ops: &Operators, goal: &[plan_core::Fact], state_values: &[u32]) -> (RelaxResult, f64) {
    let facts = FactIndex::build(vars);
    let result = relax(Combine::Sum, &facts, ops, state_values);
    let cost = result.goal_cost(Combine::Sum, &facts, goal);
    (result, cost)
}

pub fn hmax(vars: &VarSet, ops: &Operators, goal: &[plan_core::Fact], state_values: &[u32]) -> (RelaxResult, f64) {
    let facts = FactIndex::build(vars);
    let result = relax(Combine::Max, &facts, ops, state_values);
    let cost = result.goal_cost(Combine::Max, &facts, goal);
    (result, cost)
}

/// hff value plus its preferred operators, computed from the additive relaxation's relaxed plan.
pub fn hff(
    vars: &VarSet,
    ops: &Operators,
    goal: &[plan_core::Fact],
    state_values: &[u32],
) -> (f64, Vec<OpId>) {
    let facts = FactIndex::build(vars);
    let result = relax(Combine::Sum, &facts, ops, state_values);
    if goal.iter().any(|f| result.fact_cost[facts.id(*f)] == INF) {
        return (INF, Vec::new());
    }
    let preferred = relaxed_plan_preferred_ops(&facts, ops, &result, goal, state_values);
    let plan_cost: f64 = {
        let mut needed = std::collections::HashSet::new();
        let mut stack: Vec<usize> = goal.iter().map(|f| facts.id(*f)).collect();
        let mut seen = std::collections::HashSet::new();
        let mut total = 0.0;
        while let Some(fid) = stack.pop() {
            if !seen.insert(fid) || result.fact_cost[fid] == 0.0 {
                continue;
            }
            if let Some(op) = result.supporter[fid] {
                if needed.insert(op) {
                    total += ops.get(op).cost as f64;
                    for f in &ops.get(op).precond {
                        stack.push(facts.id(*f));
                    }
                }
            }
        }
        total
    };
    (plan_cost, preferred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_core::{Fact, Operator, VarId, Variable};

    fn chain_problem() -> (VarSet, Operators, Vec<Fact>) {
        // a: 0 -> 1 -> 2, each step one operator of cost 1.
        let mut vars = VarSet::new();
        vars.push(Variable::new("a", 3));
        let mut ops = Operators::new();
        ops.push(Operator::new(
            "step1",
            vec![Fact::new(VarId::from(0usize), 0)],
            vec![Fact::new(VarId::from(0usize), 1)],
            1,
        ));
        ops.push(Operator::new(
            "step2",
            vec![Fact::new(VarId::from(0usize), 1)],
            vec![Fact::new(VarId::from(0usize), 2)],
            1,
        ));
        let goal = vec![Fact::new(VarId::from(0usize), 2)];
        (vars, ops, goal)
    }

    #[test]
    fn hadd_counts_chain_length() {
        let (vars, ops, goal) = chain_problem();
        let (_, cost) = hadd(&vars, &ops, &goal, &[0]);
        assert_eq!(cost, 2.0);
    }

    #[test]
    fn hmax_equals_hadd_on_a_single_chain() {
        let (vars, ops, goal) = chain_problem();
        let (_, cost) = hmax(&vars, &ops, &goal, &[0]);
        assert_eq!(cost, 2.0);
    }

    #[test]
    fn unreachable_goal_is_infinite() {
        let (vars, _ops, goal) = chain_problem();
        // with no operators at all, the goal value is never produced.
        let (_, cost) = hadd(&vars, &Operators::new(), &goal, &[0]);
        assert!(cost.is_infinite());
    }

    #[test]
    fn hff_extracts_relaxed_plan_and_preferred_ops() {
        let (vars, ops, goal) = chain_problem();
        let (cost, preferred) = hff(&vars, &ops, &goal, &[0]);
        assert_eq!(cost, 2.0);
        assert_eq!(preferred.len(), 1);
        assert_eq!(ops.get(preferred[0]).name, "step1");
    }
}
