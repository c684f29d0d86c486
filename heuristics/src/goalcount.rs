//! Goal-count heuristic: the number of goal facts not yet satisfied. Inadmissible but free to
//! compute and a useful baseline/sanity check against the relaxation heuristics.

use plan_core::Fact;

pub fn goal_count(goal: &[Fact], state_values: &[u32]) -> u32 {
    goal.iter()
        .filter(|f| state_values[usize::from(f.var)] != f.val)
        .count() as u32
}
