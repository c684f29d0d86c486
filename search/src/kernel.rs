//! Shared search-kernel plumbing: the step result, running statistics, and the successor
//! expansion helper every kernel (EHC, lazy best-first, A*) drives through.

use plan_core::{reconstruct, Instance, OpId, Path, StateID, StatePool, StateSpace};

#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    pub expanded: u64,
    pub generated: u64,
    pub evaluated: u64,
    pub dead_ends: u64,
}

#[derive(Debug)]
pub enum Step {
    Continue,
    Found(Path),
    NotFound,
    Abort(String),
}

/// Common state every kernel owns: the problem being solved, the hash-consed state pool, and the
/// per-state search bookkeeping. Kept together so kernels can share `expand`/`goal_test` instead
/// of re-deriving them.
pub struct Context<'a> {
    pub instance: &'a Instance,
    pub pool: StatePool,
    pub space: StateSpace,
    pub stats: SearchStats,
}

impl<'a> Context<'a> {
    pub fn new(instance: &'a Instance) -> Self {
        let pool = StatePool::new(instance.packer.clone());
        let space = StateSpace::new(plan_env_param::SEGMENT_SIZE.get());
        Context {
            instance,
            pool,
            space,
            stats: SearchStats::default(),
        }
    }

    pub fn initial_state(&mut self) -> StateID {
        self.pool.insert_values(&self.instance.init)
    }

    pub fn goal_test(&self, id: StateID) -> bool {
        self.instance.goal_satisfied(&self.pool.get_values(id))
    }

    /// Applies every applicable operator at `id`, inserting the resulting states into the pool
    /// and returning `(operator, successor)` pairs. Unconditional effects are applied as a single
    /// partial-state patch; conditional effects whose condition holds in the *source* state (the
    /// condition is evaluated against the pre-state, matching §3's STRIPS-with-conditional-
    /// effects semantics) are folded into the same patch before it is applied.
    pub fn expand(&mut self, id: StateID) -> Vec<(OpId, StateID)> {
        let span = tracing::span!(tracing::Level::TRACE, "expand", state = ?id);
        let _enter = span.enter();
        self.stats.expanded += 1;
        let mut applicable = Vec::new();
        let values = self.pool.get_values(id);
        self.instance.succgen.find(&values, &mut applicable);
        tracing::trace!(applicable = applicable.len());

        let mut out = Vec::with_capacity(applicable.len());
        for op in applicable {
            let operator = self.instance.ops.get(op);
            let mut facts = operator.effects.clone();
            for ce in &operator.cond_effects {
                if ce
                    .condition
                    .iter()
                    .all(|f| values[usize::from(f.var)] == f.val)
                {
                    facts.extend(ce.effect.iter().copied());
                }
            }
            let patch = self.instance.packer.pack_partial(&facts);
            let succ = self.pool.apply_partial(&patch, id);
            self.stats.generated += 1;
            out.push((op, succ));
        }
        out
    }

    pub fn reconstruct(&self, goal: StateID) -> Path {
        reconstruct(&self.space, goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_core::loader::load_text;

    fn chain_instance() -> Instance {
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
        Instance::build(load_text(src).unwrap()).unwrap()
    }

    #[test]
    fn expand_generates_successors_via_conditional_effects_too() {
        let instance = chain_instance();
        let mut ctx = Context::new(&instance);
        let init = ctx.initial_state();
        let succs = ctx.expand(init);
        assert_eq!(succs.len(), 1);
        assert!(!ctx.goal_test(init));
        let (_, next) = succs[0];
        assert!(!ctx.goal_test(next));
    }
}
