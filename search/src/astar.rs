//! Eager A*: every generated successor is evaluated and pushed keyed by `f = g + h` immediately,
//! and a state already on the open list is reopened if a later path reaches it at a strictly
//! smaller `g`. With `--pathmax`, a child's `h` is raised to `parent_h - cost` whenever the raw
//! estimate falls short of that bound, keeping `f` non-decreasing along a path even if the
//! heuristic is locally inconsistent.

use crate::kernel::{Context, SearchStats, Step};
use crate::preferred::PreferredOpsPolicy;
use crate::priority::BucketQueue;
use plan_core::{reconstruct, Instance, OpId, StateID, Status};
use plan_heuristics::Heuristic;

struct Entry {
    state: StateID,
    parent: Option<StateID>,
    op: Option<OpId>,
    g: u32,
    h: u32,
}

pub struct AStar<'a, H: Heuristic> {
    ctx: Context<'a>,
    heuristic: H,
    policy: PreferredOpsPolicy,
    pathmax: bool,
    open: BucketQueue<Entry>,
}

impl<'a, H: Heuristic> AStar<'a, H> {
    pub fn new(instance: &'a Instance, mut heuristic: H, policy: PreferredOpsPolicy, pathmax: bool) -> Self {
        let mut ctx = Context::new(instance);
        let init = ctx.initial_state();
        let values = ctx.pool.get_values(init);
        let estimate = heuristic.evaluate(&instance.vars, &instance.ops, &instance.goal, &values);
        let h = estimate.h;
        ctx.space.open(init, None, None, 0, h).expect("fresh state");

        let mut open = BucketQueue::new();
        if !estimate.is_dead_end() {
            open.push(
                h,
                Entry {
                    state: init,
                    parent: None,
                    op: None,
                    g: 0,
                    h,
                },
            );
        }
        AStar {
            ctx,
            heuristic,
            policy,
            pathmax,
            open,
        }
    }

    pub fn stats(&self) -> &SearchStats {
        &self.ctx.stats
    }

    /// Evaluates and pushes every successor of `from` (whose own cost-so-far is `from_g`, heuristic
    /// value `from_h`), skipping any successor already closed at a cost this path can't beat.
    fn expand_and_push(&mut self, from: StateID, from_g: u32, from_h: u32, preferred: &[OpId]) {
        let succs = self.ctx.expand(from);
        let mut ops: Vec<OpId> = succs.iter().map(|(op, _)| *op).collect();
        self.policy.order(&mut ops, preferred);
        let order: hashbrown::HashMap<OpId, usize> = ops.iter().enumerate().map(|(i, &o)| (o, i)).collect();
        let mut succs = succs;
        succs.sort_by_key(|(op, _)| order[op]);

        for (op, succ) in succs {
            let cost = self.ctx.instance.ops.get(op).cost;
            let g = from_g + cost;
            if matches!(self.ctx.space.status(succ), Status::Closed) {
                let closed_g = self.ctx.space.get(succ).map(|n| n.g).unwrap_or(u32::MAX);
                if g >= closed_g {
                    continue;
                }
            }

            let values = self.ctx.pool.get_values(succ);
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
            let h = if self.pathmax {
                estimate.h.max(from_h.saturating_sub(cost))
            } else {
                estimate.h
            };
            self.open.push(
                g.saturating_add(h),
                Entry {
                    state: succ,
                    parent: Some(from),
                    op: Some(op),
                    g,
                    h,
                },
            );
        }
    }

    pub fn step(&mut self) -> Step {
        loop {
            let Some((_, entry)) = self.open.pop() else {
                tracing::debug!(expanded = self.ctx.stats.expanded, "open list exhausted");
                return Step::NotFound;
            };

            match self.ctx.space.status(entry.state) {
                Status::Closed => {
                    let current_g = self.ctx.space.get(entry.state).map(|n| n.g).unwrap_or(u32::MAX);
                    if entry.g >= current_g {
                        continue; // stale: already expanded at an equal-or-better cost
                    }
                    self.ctx
                        .space
                        .reopen(entry.state, entry.parent, entry.op, entry.g, entry.h)
                        .expect("checked g strictly improves above");
                }
                Status::Open => {
                    let current_g = self.ctx.space.get(entry.state).map(|n| n.g).unwrap_or(u32::MAX);
                    if entry.g > current_g {
                        continue; // a cheaper entry for this state is already queued
                    }
                }
                Status::New => {
                    self.ctx
                        .space
                        .open(entry.state, entry.parent, entry.op, entry.g, entry.h)
                        .expect("fresh state");
                }
            }

            let values = self.ctx.pool.get_values(entry.state);
            if self.ctx.instance.goal_satisfied(&values) {
                self.ctx.space.close(entry.state).ok();
                let path = reconstruct(&self.ctx.space, entry.state);
                tracing::debug!(len = path.len(), cost = entry.g, "goal found");
                return Step::Found(path);
            }

            self.ctx.stats.expanded += 1;
            let estimate = self.heuristic.evaluate(
                &self.ctx.instance.vars,
                &self.ctx.instance.ops,
                &self.ctx.instance.goal,
                &values,
            );
            self.ctx.space.close(entry.state).ok();
            self.expand_and_push(entry.state, entry.g, entry.h, &estimate.preferred);
            return Step::Continue;
        }
    }
}
