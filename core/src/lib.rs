//! Factored-representation planning core: finite-domain variables, bit-packed states, operators,
//! the successor generator, and the state-space bookkeeping heuristics and search build on.

pub mod error;
pub mod loader;
pub mod operator;
pub mod packer;
pub mod path;
pub mod pool;
pub mod state;
pub mod state_space;
pub mod succgen;
pub mod variable;

pub use error::PlanError;
pub use operator::{OpId, Operator, Operators};
pub use packer::StatePacker;
pub use path::{reconstruct, Path};
pub use pool::StatePool;
pub use state::{MaskedBuffer, PackedState, StateID};
pub use state_space::{StateSpace, Status, DEAD_END};
pub use succgen::SuccessorGenerator;
pub use variable::{AgentMask, Fact, VarId, VarSet, Variable};

/// A fully loaded problem instance: variables, operators, initial state, and goal condition,
/// plus the derived structures (`StatePacker`, `SuccessorGenerator`) everything else is built
/// from. Constructing one from a `loader::Problem` is the normal entry point for both the CLI
/// and tests.
pub struct Instance {
    pub vars: VarSet,
    pub ops: Operators,
    pub packer: StatePacker,
    pub succgen: SuccessorGenerator,
    pub init: Vec<u32>,
    pub goal: Vec<Fact>,
}

impl Instance {
    pub fn build(problem: loader::Problem) -> Result<Self, PlanError> {
        let packer = StatePacker::build(&problem.vars)?;
        let succgen = SuccessorGenerator::build(&problem.vars, &problem.ops);
        Ok(Instance {
            vars: problem.vars,
            ops: problem.ops,
            packer,
            succgen,
            init: problem.init,
            goal: problem.goal,
        })
    }

    pub fn goal_satisfied(&self, values: &[u32]) -> bool {
        self.goal.iter().all(|f| values[usize::from(f.var)] == f.val)
    }
}
