//! Lazy best-first search: the open list carries `(parent, op, g)` triples keyed by the parent's
//! already-known heuristic value, so a state's *own* heuristic is only computed once it is
//! actually popped — most generated states are pruned as duplicates before ever paying for an
//! evaluation.

use crate::kernel::{Context, SearchStats, Step};
use crate::lazy_list::{Backend, Entry, LazyOpenList};
use crate::preferred::PreferredOpsPolicy;
use plan_core::{reconstruct, Instance, Status};
use plan_heuristics::Heuristic;

pub struct LazyBfs<'a, H: Heuristic> {
    ctx: Context<'a>,
    heuristic: H,
    policy: PreferredOpsPolicy,
    open: LazyOpenList,
}

impl<'a, H: Heuristic> LazyBfs<'a, H> {
    pub fn new(instance: &'a Instance, mut heuristic: H, policy: PreferredOpsPolicy, backend: Backend) -> Self {
        let mut ctx = Context::new(instance);
        let init = ctx.initial_state();
        let values = ctx.pool.get_values(init);
        let estimate = heuristic.evaluate(&instance.vars, &instance.ops, &instance.goal, &values);
        ctx.space.open(init, None, None, 0, estimate.h).expect("fresh state");

        let mut open = LazyOpenList::new(backend);
        if !estimate.is_dead_end() {
            open.push(
                estimate.h,
                Entry {
                    state: init,
                    parent: None,
                    op: None,
                    g: 0,
                },
            );
        }
        LazyBfs {
            ctx,
            heuristic,
            policy,
            open,
        }
    }

    pub fn stats(&self) -> &SearchStats {
        &self.ctx.stats
    }

    /// Pops and processes one open-list entry: evaluate its real `h` if this is its first visit,
    /// skip it if it turns out stale, otherwise expand it and push its successors.
    pub fn step(&mut self) -> Step {
        let Some(entry) = self.open.pop() else {
            tracing::debug!(expanded = self.ctx.stats.expanded, "open list exhausted");
            return Step::NotFound;
        };

        let already_closed = matches!(self.ctx.space.status(entry.state), Status::Closed);
        let better_g_seen = self
            .ctx
            .space
            .get(entry.state)
            .map(|n| n.g < entry.g)
            .unwrap_or(false);
        if already_closed && better_g_seen {
            return Step::Continue; // stale entry superseded by a cheaper path already expanded
        }

        if matches!(self.ctx.space.status(entry.state), Status::New) {
            self.ctx
                .space
                .open(entry.state, entry.parent, entry.op, entry.g, 0)
                .expect("fresh state");
        }

        if self.ctx.instance.goal_satisfied(&self.ctx.pool.get_values(entry.state)) {
            self.ctx.space.close(entry.state).ok();
            let path = reconstruct(&self.ctx.space, entry.state);
            tracing::debug!(len = path.len(), expanded = self.ctx.stats.expanded, "goal found");
            return Step::Found(path);
        }

        let values = self.ctx.pool.get_values(entry.state);
        let estimate = self.heuristic.evaluate(
            &self.ctx.instance.vars,
            &self.ctx.instance.ops,
            &self.ctx.instance.goal,
            &values,
        );
        self.ctx.stats.evaluated += 1;
        if estimate.is_dead_end() {
            self.ctx.stats.dead_ends += 1;
            return Step::Continue;
        }
        self.ctx.space.set_h(entry.state, estimate.h);
        self.ctx.space.close(entry.state).ok();

        let succs = self.ctx.expand(entry.state);
        let mut ops: Vec<_> = succs.iter().map(|(op, _)| *op).collect();
        self.policy.order(&mut ops, &estimate.preferred);
        let order: hashbrown::HashMap<_, _> = ops.iter().enumerate().map(|(i, &o)| (o, i)).collect();
        let mut succs = succs;
        succs.sort_by_key(|(op, _)| order[op]);

        for (op, succ) in succs {
            if matches!(self.ctx.space.status(succ), Status::New) {
                let cost = self.ctx.instance.ops.get(op).cost;
                let parent_g = self.ctx.space.get(entry.state).map(|n| n.g).unwrap_or(0);
                self.open.push(
                    estimate.h,
                    Entry {
                        state: succ,
                        parent: Some(entry.state),
                        op: Some(op),
                        g: parent_g + cost,
                    },
                );
            }
        }

        Step::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_core::loader::load_text;
    use plan_heuristics::AddHeuristic;

    #[test]
    fn lazy_bfs_solves_a_simple_chain() {
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
        let mut search = LazyBfs::new(&instance, AddHeuristic, PreferredOpsPolicy::None, Backend::Heap);
        let path = loop {
            match search.step() {
                Step::Found(path) => break path,
                Step::Continue => continue,
                other => panic!("unexpected: {other:?}"),
            }
        };
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn lazy_bfs_exhausts_to_not_found_on_dead_end() {
        let src = "
            var a 2
            init 0
            goal 0 1
        ";
        let instance = Instance::build(load_text(src).unwrap()).unwrap();
        let mut search = LazyBfs::new(&instance, AddHeuristic, PreferredOpsPolicy::None, Backend::Fifo);
        loop {
            match search.step() {
                Step::NotFound => break,
                Step::Continue => continue,
                other => panic!("unexpected: {other:?}"),
            }
        }
    }
}
