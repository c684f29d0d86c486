//! Enforced hill climbing: breadth-first search from the current state for the first successor
//! with a strictly smaller heuristic value, then jump there and repeat. Each `step()` call runs
//! one full local BFS phase.

use crate::kernel::{Context, SearchStats, Step};
use crate::preferred::PreferredOpsPolicy;
use hashbrown::HashMap;
use plan_core::{reconstruct, Instance, OpId, StateID};
use plan_heuristics::Heuristic;
use std::collections::VecDeque;

pub struct Ehc<'a, H: Heuristic> {
    ctx: Context<'a>,
    heuristic: H,
    policy: PreferredOpsPolicy,
    current: StateID,
    current_h: u32,
    current_preferred: Vec<OpId>,
}

impl<'a, H: Heuristic> Ehc<'a, H> {
    pub fn new(instance: &'a Instance, mut heuristic: H, policy: PreferredOpsPolicy) -> Self {
        let mut ctx = Context::new(instance);
        let init = ctx.initial_state();
        let values = ctx.pool.get_values(init);
        let estimate = heuristic.evaluate(&instance.vars, &instance.ops, &instance.goal, &values);
        let h = estimate.h;
        ctx.space.open(init, None, None, 0, h).expect("fresh state");
        Ehc {
            ctx,
            heuristic,
            policy,
            current: init,
            current_h: h,
            current_preferred: estimate.preferred,
        }
    }

    pub fn stats(&self) -> &SearchStats {
        &self.ctx.stats
    }

    pub fn step(&mut self) -> Step {
        if self.ctx.goal_test(self.current) {
            let path = reconstruct(&self.ctx.space, self.current);
            tracing::debug!(len = path.len(), "goal found");
            return Step::Found(path);
        }
        if self.current_h == plan_core::DEAD_END {
            tracing::debug!("current state is a dead end, no local BFS can escape it");
            return Step::NotFound;
        }

        let mut queue = VecDeque::new();
        let mut came_from: HashMap<StateID, (StateID, OpId)> = HashMap::new();
        let mut visited: hashbrown::HashSet<StateID> = hashbrown::HashSet::new();
        queue.push_back(self.current);
        visited.insert(self.current);

        while let Some(s) = queue.pop_front() {
            let mut succs = self.ctx.expand(s);
            let mut ops: Vec<OpId> = succs.iter().map(|(op, _)| *op).collect();
            self.policy.order(&mut ops, &self.current_preferred);
            let order: HashMap<OpId, usize> = ops.iter().enumerate().map(|(i, &o)| (o, i)).collect();
            succs.sort_by_key(|(op, _)| order[op]);

            for (op, succ) in succs {
                if !visited.insert(succ) {
                    continue;
                }
                came_from.insert(succ, (s, op));
                let values = self.ctx.pool.get_values(succ);

                if self.ctx.instance.goal_satisfied(&values) {
                    self.commit_path(&came_from, succ);
                    self.current = succ;
                    self.current_h = 0;
                    return Step::Found(reconstruct(&self.ctx.space, succ));
                }

                let estimate = self.heuristic.evaluate(
                    &self.ctx.instance.vars,
                    &self.ctx.instance.ops,
                    &self.ctx.instance.goal,
                    &values,
                );
                self.ctx.stats.evaluated += 1;
                if estimate.is_dead_end() {
                    self.ctx.stats.dead_ends += 1;
                    continue;
                }
                if estimate.h < self.current_h {
                    self.commit_path(&came_from, succ);
                    self.current = succ;
                    self.current_h = estimate.h;
                    self.current_preferred = estimate.preferred;
                    return Step::Continue;
                }
                queue.push_back(succ);
            }
        }
        tracing::debug!("local BFS exhausted without finding an improving successor");
        Step::NotFound
    }

    /// Opens every state on the BFS path from `self.current` to `target` in the permanent state
    /// space, so `reconstruct` can walk it later regardless of how far the jump was.
    fn commit_path(&mut self, came_from: &HashMap<StateID, (StateID, OpId)>, target: StateID) {
        let mut chain = Vec::new();
        let mut cur = target;
        while let Some(&(parent, op)) = came_from.get(&cur) {
            chain.push((cur, parent, op));
            cur = parent;
        }
        chain.reverse();
        for (state, parent, op) in chain {
            if self.ctx.space.status(state) == plan_core::Status::New {
                let parent_g = self.ctx.space.get(parent).map(|n| n.g).unwrap_or(0);
                let cost = self.ctx.instance.ops.get(op).cost;
                self.ctx
                    .space
                    .open(state, Some(parent), Some(op), parent_g + cost, 0)
                    .expect("fresh state");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_core::loader::load_text;
    use plan_heuristics::AddHeuristic;

    #[test]
    fn ehc_solves_a_simple_chain() {
        let src = "
            var a 3
            init 0
            op step1 1
            pre 0 0
            eff 0 1
            op step2 1
            pre 0 1
            eff 0 2
            goal 0 2
        ";
        let instance = Instance::build(load_text(src).unwrap()).unwrap();
        let mut ehc = Ehc::new(&instance, AddHeuristic, PreferredOpsPolicy::None);
        let path = loop {
            match ehc.step() {
                Step::Found(path) => break path,
                Step::Continue => continue,
                other => panic!("unexpected step result: {other:?}"),
            }
        };
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn ehc_reports_not_found_on_an_unreachable_goal() {
        let src = "
            var a 2
            init 0
            goal 0 1
        ";
        let instance = Instance::build(load_text(src).unwrap()).unwrap();
        let mut ehc = Ehc::new(&instance, AddHeuristic, PreferredOpsPolicy::None);
        assert!(matches!(ehc.step(), Step::NotFound));
    }
}
