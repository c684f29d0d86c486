//! LM-Cut: iteratively extracts a disjunctive action landmark from the hmax justification graph,
//! charges its cheapest operator's cost against the heuristic total, then zeroes that cost out
//! and repeats until the (cost-reduced) goal is free.

use crate::facts::FactIndex;
use crate::landmarks::LandmarkCache;
use plan_core::{OpId, Operators, VarSet};

const INF: f64 = f64::INFINITY;

/// hmax fact costs under a per-operator cost override, plus each operator's "supporter" fact:
/// the precondition fact realizing the max (the edge the justification graph hangs off of).
fn hmax_with_costs(
    facts: &FactIndex,
    ops: &Operators,
    state_values: &[u32],
    op_cost: &[f64],
) -> (Vec<f64>, Vec<Option<usize>>) {
    let num_facts = facts.num_facts();
    let mut fact_cost = vec![INF; num_facts];
    let mut supporter: Vec<Option<usize>> = vec![None; ops.len()];
    let mut update = vec![false; ops.len()];
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

    let mut op_achieved_cost = vec![INF; ops.len()];
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
            let (c, sup) = precond
                .iter()
                .map(|f| (fact_cost[facts.id(*f)], facts.id(*f)))
                .fold((0.0f64, None), |(best, best_f), (c, f)| {
                    if c > best {
                        (c, Some(f))
                    } else {
                        (best, best_f)
                    }
                });
            if c < op_achieved_cost[oi] {
                op_achieved_cost[oi] = c;
                supporter[oi] = sup;
                for eff in &ops.get(op).effects {
                    let fid = facts.id(*eff);
                    let new_cost = c + op_cost[oi];
                    if new_cost < fact_cost[fid] {
                        fact_cost[fid] = new_cost;
                        for &dep in &dependents[fid] {
                            update[usize::from(dep)] = true;
                        }
                        again = true;
                    }
                }
            }
        }
    }
    (fact_cost, supporter)
}

/// Backward 0-cost-edge reachability from the goal fact: which facts can reach the goal through
/// a chain of operators whose *current* cost is 0.
fn goal_zone(
    facts: &FactIndex,
    ops: &Operators,
    goal: &[plan_core::Fact],
    op_cost: &[f64],
    supporter: &[Option<usize>],
    fact_cost: &[f64],
) -> std::collections::HashSet<usize> {
    // An edge supporter(op) -> effect exists per op; it is traversable backward iff op_cost==0.
    // Seed the zone with every goal fact that is achievable (finite cost); from there, any fact
    // whose achieving op (as a *consumer*, i.e. any op using it as supporter) is 0-cost and whose
    // effect is already in the zone also belongs.
    let mut zone: std::collections::HashSet<usize> =
        goal.iter().map(|f| facts.id(*f)).filter(|&f| fact_cost[f] < INF).collect();
    let mut changed = true;
    while changed {
        changed = false;
        for op in ops.iter() {
            let oi = usize::from(op);
            if op_cost[oi] != 0.0 {
                continue;
            }
            let Some(sup) = supporter[oi] else { continue };
            if zone.contains(&sup) {
                continue;
            }
            let touches_zone = ops.get(op).effects.iter().any(|e| zone.contains(&facts.id(*e)));
            if touches_zone {
                zone.insert(sup);
                changed = true;
            }
        }
    }
    zone
}

/// Runs LM-Cut to completion and returns the admissible heuristic estimate (possibly `INF`).
pub fn lmcut(vars: &VarSet, ops: &Operators, goal: &[plan_core::Fact], state_values: &[u32]) -> f64 {
    let mut scratch = LandmarkCache::new();
    lmcut_with_landmarks(vars, ops, goal, state_values, &mut scratch).0
}

/// Like `lmcut`, but also registers every extracted disjunctive landmark into `cache` and
/// returns their ids, so callers building the flow heuristic's optional LM-Cut rows (or a
/// subsequent LM-Cut call on a related state) can reuse them instead of re-deriving the cuts.
pub fn lmcut_with_landmarks(
    vars: &VarSet,
    ops: &Operators,
    goal: &[plan_core::Fact],
    state_values: &[u32],
    cache: &mut LandmarkCache,
) -> (f64, Vec<crate::landmarks::LandmarkId>) {
    let facts = FactIndex::build(vars);
    let mut op_cost: Vec<f64> = ops.iter().map(|o| ops.get(o).cost as f64).collect();
    let mut total = 0.0;
    let mut landmark_ids = Vec::new();

    loop {
        let (fact_cost, supporter) = hmax_with_costs(&facts, ops, state_values, &op_cost);
        let goal_cost = goal.iter().map(|f| fact_cost[facts.id(*f)]).fold(0.0f64, f64::max);
        if goal_cost == INF {
            return (INF, landmark_ids);
        }
        if goal_cost <= 0.0 {
            return (total, landmark_ids);
        }
        let zone = goal_zone(&facts, ops, goal, &op_cost, &supporter, &fact_cost);

        // the landmark: operators whose supporter lies outside the goal zone but which reach
        // into it.
        let mut landmark: Vec<OpId> = Vec::new();
        for op in ops.iter() {
            let oi = usize::from(op);
            let Some(sup) = supporter[oi] else { continue };
            if zone.contains(&sup) {
                continue;
            }
            if ops.get(op).effects.iter().any(|e| zone.contains(&facts.id(*e))) {
                landmark.push(op);
            }
        }
        if landmark.is_empty() {
            // Should not happen once goal_cost > 0, but guard against a malformed operator set
            // (e.g. an operator with no preconditions feeding the goal directly at non-zero
            // cost) rather than loop forever.
            return (total + goal_cost, landmark_ids);
        }
        let cut_cost = landmark
            .iter()
            .map(|&op| op_cost[usize::from(op)])
            .fold(INF, f64::min);
        total += cut_cost;
        landmark_ids.push(cache.insert(landmark.clone()));
        for &op in &landmark {
            op_cost[usize::from(op)] -= cut_cost;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_core::{Fact, Operator, VarId, Variable};

    #[test]
    fn two_independent_unit_cost_steps_give_cost_two() {
        let mut vars = VarSet::new();
        vars.push(Variable::new("a", 2));
        vars.push(Variable::new("b", 2));
        let mut ops = Operators::new();
        ops.push(Operator::new(
            "flip-a",
            vec![Fact::new(VarId::from(0usize), 0)],
            vec![Fact::new(VarId::from(0usize), 1)],
            1,
        ));
        ops.push(Operator::new(
            "flip-b",
            vec![Fact::new(VarId::from(1usize), 0)],
            vec![Fact::new(VarId::from(1usize), 1)],
            1,
        ));
        let goal = vec![
            Fact::new(VarId::from(0usize), 1),
            Fact::new(VarId::from(1usize), 1),
        ];
        assert_eq!(lmcut(&vars, &ops, &goal, &[0, 0]), 2.0);
    }

    #[test]
    fn unreachable_goal_is_infinite() {
        let mut vars = VarSet::new();
        vars.push(Variable::new("a", 2));
        let ops = Operators::new();
        let goal = vec![Fact::new(VarId::from(0usize), 1)];
        assert_eq!(lmcut(&vars, &ops, &goal, &[0]), INF);
    }

    #[test]
    fn already_satisfied_goal_is_zero() {
        let mut vars = VarSet::new();
        vars.push(Variable::new("a", 2));
        let ops = Operators::new();
        let goal = vec![Fact::new(VarId::from(0usize), 0)];
        assert_eq!(lmcut(&vars, &ops, &goal, &[0]), 0.0);
    }
}
