//! Heuristic evaluators over the packed state space: goal-count, additive/max/FF delta
//! relaxation, LM-Cut, network-flow LP, and potential-function LP, behind one `Heuristic` trait
//! the search kernels drive uniformly.

pub mod facts;
pub mod flow;
pub mod goalcount;
pub mod landmarks;
pub mod lmcut;
pub mod lp;
pub mod potential;
pub mod relax;

use facts::FactIndex;
use landmarks::LandmarkCache;
use plan_core::{Fact, OpId, Operators, VarSet, DEAD_END};

/// A heuristic call's result: the (possibly `DEAD_END`) estimate, plus any preferred operators
/// the heuristic singled out (only FF populates this; every other heuristic returns an empty
/// list, which `plan_search::preferred`'s `PreferredOpsPolicy::None`/`Prefer` handle uniformly).
#[derive(Debug, Clone)]
pub struct Estimate {
    pub h: u32,
    pub preferred: Vec<OpId>,
}

impl Estimate {
    fn from_cost(cost: f64) -> Self {
        Estimate {
            h: cost_to_u32(cost),
            preferred: Vec::new(),
        }
    }

    pub fn is_dead_end(&self) -> bool {
        self.h == DEAD_END
    }
}

/// Tolerance for the usual LP float noise (e.g. a true `2.0` coming back as `1.9999999998`),
/// so rounding down per §4.6 doesn't silently truncate a whole unit of cost.
const ROUNDING_EPS: f64 = 1e-6;

fn cost_to_u32(cost: f64) -> u32 {
    if cost.is_infinite() || cost.is_nan() {
        DEAD_END
    } else {
        (cost + ROUNDING_EPS).floor().max(0.0) as u32
    }
}

pub trait Heuristic {
    fn evaluate(&mut self, vars: &VarSet, ops: &Operators, goal: &[Fact], state_values: &[u32]) -> Estimate;
}

/// Lets the CLI pick a heuristic at runtime behind `Box<dyn Heuristic>` instead of monomorphizing
/// a search kernel per `--heur` value.
impl Heuristic for Box<dyn Heuristic> {
    fn evaluate(&mut self, vars: &VarSet, ops: &Operators, goal: &[Fact], state_values: &[u32]) -> Estimate {
        (**self).evaluate(vars, ops, goal, state_values)
    }
}

pub struct GoalCountHeuristic;
impl Heuristic for GoalCountHeuristic {
    fn evaluate(&mut self, _vars: &VarSet, _ops: &Operators, goal: &[Fact], state_values: &[u32]) -> Estimate {
        Estimate::from_cost(goalcount::goal_count(goal, state_values) as f64)
    }
}

pub struct AddHeuristic;
impl Heuristic for AddHeuristic {
    fn evaluate(&mut self, vars: &VarSet, ops: &Operators, goal: &[Fact], state_values: &[u32]) -> Estimate {
        let (_, cost) = relax::hadd(vars, ops, goal, state_values);
        Estimate::from_cost(cost)
    }
}

pub struct MaxHeuristic;
impl Heuristic for MaxHeuristic {
    fn evaluate(&mut self, vars: &VarSet, ops: &Operators, goal: &[Fact], state_values: &[u32]) -> Estimate {
        let (_, cost) = relax::hmax(vars, ops, goal, state_values);
        Estimate::from_cost(cost)
    }
}

pub struct FfHeuristic;
impl Heuristic for FfHeuristic {
    fn evaluate(&mut self, vars: &VarSet, ops: &Operators, goal: &[Fact], state_values: &[u32]) -> Estimate {
        let (cost, preferred) = relax::hff(vars, ops, goal, state_values);
        Estimate {
            h: cost_to_u32(cost),
            preferred,
        }
    }
}

#[derive(Default)]
pub struct LmCutHeuristic {
    pub cache: LandmarkCache,
}
impl Heuristic for LmCutHeuristic {
    fn evaluate(&mut self, vars: &VarSet, ops: &Operators, goal: &[Fact], state_values: &[u32]) -> Estimate {
        let (cost, _) = lmcut::lmcut_with_landmarks(vars, ops, goal, state_values, &mut self.cache);
        Estimate::from_cost(cost)
    }
}

pub struct FlowHeuristic {
    pub options: flow::FlowOptions,
    pub cache: LandmarkCache,
}
impl FlowHeuristic {
    pub fn new(options: flow::FlowOptions) -> Self {
        FlowHeuristic {
            options,
            cache: LandmarkCache::new(),
        }
    }
}
impl Heuristic for FlowHeuristic {
    fn evaluate(&mut self, vars: &VarSet, ops: &Operators, goal: &[Fact], state_values: &[u32]) -> Estimate {
        let cost = flow::flow_heuristic(vars, ops, goal, state_values, self.options, &mut self.cache);
        Estimate::from_cost(cost)
    }
}

/// Wraps a once-computed `potential::PotentialHeuristic`. The CLI's `pot` and `pot-all-synt-states`
/// variants differ only in the `samples` passed to `new`: one state (the initial state) versus
/// every syntactic state in the variables' domains.
pub struct PotHeuristic {
    facts: FactIndex,
    inner: Option<potential::PotentialHeuristic>,
}
impl PotHeuristic {
    pub fn new(vars: &VarSet, ops: &Operators, goal: &[Fact], samples: &[Vec<u32>]) -> Self {
        PotHeuristic {
            facts: FactIndex::build(vars),
            inner: potential::PotentialHeuristic::build_for_samples(vars, ops, goal, samples),
        }
    }
}
impl Heuristic for PotHeuristic {
    fn evaluate(&mut self, _vars: &VarSet, _ops: &Operators, _goal: &[Fact], state_values: &[u32]) -> Estimate {
        match &self.inner {
            Some(pot) => Estimate::from_cost(pot.eval(&self.facts, state_values)),
            // LP infeasible to build (should not happen for a well-formed problem); treat every
            // state as uninformed rather than lying about dead ends.
            None => Estimate::from_cost(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_core::{Operator, VarId, Variable};

    fn chain() -> (VarSet, Operators, Vec<Fact>) {
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
    fn every_heuristic_agrees_on_the_chain_cost() {
        let (vars, ops, goal) = chain();
        let state = vec![0u32];
        let mut add = AddHeuristic;
        let mut max = MaxHeuristic;
        let mut ff = FfHeuristic;
        let mut lmcut = LmCutHeuristic::default();
        assert_eq!(add.evaluate(&vars, &ops, &goal, &state).h, 2);
        assert_eq!(max.evaluate(&vars, &ops, &goal, &state).h, 2);
        assert_eq!(ff.evaluate(&vars, &ops, &goal, &state).h, 2);
        assert_eq!(lmcut.evaluate(&vars, &ops, &goal, &state).h, 2);
    }

    #[test]
    fn dead_end_reported_consistently() {
        let mut vars = VarSet::new();
        vars.push(Variable::new("a", 2));
        let ops = Operators::new();
        let goal = vec![Fact::new(VarId::from(0usize), 1)];
        let mut add = AddHeuristic;
        let estimate = add.evaluate(&vars, &ops, &goal, &[0]);
        assert!(estimate.is_dead_end());
    }
}
