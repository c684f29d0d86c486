//! Potential heuristic: a one-shot LP picks a per-fact weight `w_f` such that `sum_{f in s} w_f`
//! never overestimates the true cost to the goal from any state an operator can reach; after
//! that single solve, evaluating a state is just summing the weights of its facts.

use crate::facts::FactIndex;
use crate::lp::{LpProblem, LpResult, LpRow, LpSolver, RowOp, TwoPhaseSimplex};
use plan_core::{Fact, Operators, VarSet};

pub struct PotentialHeuristic {
    weights: Vec<f64>,
}

impl PotentialHeuristic {
    /// Optimizes the potential function for a single sample state — ordinarily the problem's
    /// initial state (CLI `--heur pot`).
    pub fn build(vars: &VarSet, ops: &Operators, goal: &[Fact], sample: &[u32]) -> Option<Self> {
        Self::build_for_samples(vars, ops, goal, std::slice::from_ref(&sample.to_vec()))
    }

    /// Optimizes the potential function to maximize its *average* value across several sample
    /// states (CLI `--heur pot-all-synt-states`: samples drawn from states synthesized during an
    /// earlier search pass), which tends to give a more informative heuristic across the whole
    /// search than optimizing for the initial state alone.
    pub fn build_for_samples(
        vars: &VarSet,
        ops: &Operators,
        goal: &[Fact],
        samples: &[Vec<u32>],
    ) -> Option<Self> {
        let facts = FactIndex::build(vars);
        let n = facts.num_facts();
        // variable 2i = w_i+, 2i+1 = w_i-; w_i = w_i+ - w_i-.
        let mut problem = LpProblem::new(2 * n);

        for sample in samples {
            for &fid in &facts.state_facts(sample) {
                problem.objective[2 * fid] += 1.0 / samples.len() as f64;
                problem.objective[2 * fid + 1] -= 1.0 / samples.len() as f64;
            }
        }

        for op in ops.iter() {
            let mut row = LpRow::new(RowOp::Ge, -(ops.get(op).cost as f64));
            for f in &ops.get(op).precond {
                let fid = facts.id(*f);
                row.coeffs.push((2 * fid, 1.0));
                row.coeffs.push((2 * fid + 1, -1.0));
            }
            for f in &ops.get(op).effects {
                let fid = facts.id(*f);
                row.coeffs.push((2 * fid, -1.0));
                row.coeffs.push((2 * fid + 1, 1.0));
            }
            problem.rows.push(row);
        }

        for g in goal {
            let fid = facts.id(*g);
            // w_g <= 0  <=>  -w_g >= 0  <=>  w_g- - w_g+ >= 0
            problem
                .rows
                .push(LpRow::new(RowOp::Ge, 0.0).with(2 * fid + 1, 1.0).with(2 * fid, -1.0));
        }

        let solver = TwoPhaseSimplex::new();
        match solver.solve(&problem) {
            LpResult::Optimal { assignment, .. } => {
                let weights = (0..n).map(|i| assignment[2 * i] - assignment[2 * i + 1]).collect();
                Some(PotentialHeuristic { weights })
            }
            _ => None,
        }
    }

    /// `max(0, sum_{f in state} w_f)`: clamped so the heuristic never reports a negative estimate
    /// even though the underlying LP only guarantees non-overestimation, not non-negativity.
    pub fn eval(&self, facts: &FactIndex, state_values: &[u32]) -> f64 {
        let sum: f64 = facts.state_facts(state_values).iter().map(|&fid| self.weights[fid]).sum();
        sum.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_core::{Operator, VarId, Variable};

    #[test]
    fn potential_heuristic_is_admissible_on_a_chain() {
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
        let facts = FactIndex::build(&vars);

        let h = PotentialHeuristic::build(&vars, &ops, &goal, &[0]).unwrap();
        // true optimal cost from value 0 is 2; admissibility requires h <= true cost.
        assert!(h.eval(&facts, &[0]) <= 2.0 + 1e-6);
        assert!(h.eval(&facts, &[2]) <= 1e-6);
    }
}
