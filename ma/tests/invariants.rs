//! Invariant 10 (MA agreement) and invariant 11 (snapshot soundness, exercised indirectly): a
//! two-agent factored run over a small synthetic problem must return a plan of the same cost as
//! single-agent search on the same joined instance — anything else would mean the snapshot
//! protocol either confirmed a cost that wasn't actually optimal, or never confirmed one at all.

use plan_core::loader::Problem;
use plan_core::{AgentMask, Fact, Instance, Operator, Operators, VarSet, Variable};
use plan_heuristics::AddHeuristic;
use plan_ma::comm_queue::build_pool;
use plan_ma::scope::{scoped_ops, HeurScope};
use plan_ma::{AgentStep, Comm, MaAgent};
use plan_search::astar::AStar;
use plan_search::kernel::Step;
use plan_search::lazy_list::Backend;
use plan_search::preferred::PreferredOpsPolicy;

/// Agent 0 owns a 3-step chain on `a`, agent 1 owns a 2-step chain on `b` that only starts once
/// `a` reaches its midpoint — so neither agent can reach the goal alone and the optimal joined
/// plan is exactly 5 steps.
fn factored_instance() -> Instance {
    let mut vars = VarSet::new();
    vars.push(Variable::new("a", 4));
    vars.push(Variable::new("b", 3));

    let both = {
        let mut mask = AgentMask::EMPTY;
        mask.insert(0);
        mask.insert(1);
        mask
    };

    let mut ops = Operators::new();
    ops.push(Operator {
        owners: both,
        ..Operator::new("a1", vec![Fact::new(0usize.into(), 0)], vec![Fact::new(0usize.into(), 1)], 1).with_owner(0)
    });
    ops.push(Operator {
        owners: both,
        ..Operator::new("a2", vec![Fact::new(0usize.into(), 1)], vec![Fact::new(0usize.into(), 2)], 1).with_owner(0)
    });
    ops.push(Operator {
        owners: both,
        ..Operator::new("a3", vec![Fact::new(0usize.into(), 2)], vec![Fact::new(0usize.into(), 3)], 1).with_owner(0)
    });
    ops.push(Operator {
        owners: both,
        ..Operator::new(
            "b1",
            vec![Fact::new(0usize.into(), 1), Fact::new(1usize.into(), 0)],
            vec![Fact::new(1usize.into(), 1)],
            1,
        )
        .with_owner(1)
    });
    ops.push(Operator {
        owners: both,
        ..Operator::new("b2", vec![Fact::new(1usize.into(), 1)], vec![Fact::new(1usize.into(), 2)], 1).with_owner(1)
    });

    let problem = Problem {
        vars,
        ops,
        init: vec![0, 0],
        goal: vec![Fact::new(0usize.into(), 3), Fact::new(1usize.into(), 2)],
    };
    Instance::build(problem).unwrap()
}

fn single_agent_optimum(instance: &Instance) -> u32 {
    let mut astar = AStar::new(instance, AddHeuristic, PreferredOpsPolicy::None, false);
    loop {
        match astar.step() {
            Step::Found(path) => return path.cost(&instance.ops),
            Step::Continue => continue,
            other => panic!("unexpected: {other:?}"),
        }
    }
}

fn run_agent(instance: &Instance, comm: impl Comm) -> Option<plan_core::Path> {
    let agent_id = comm.id();
    let heur_ops = scoped_ops(&instance.ops, agent_id, HeurScope::Global);
    let mut agent = MaAgent::new(instance, AddHeuristic, heur_ops, PreferredOpsPolicy::None, Backend::Heap, comm);
    loop {
        match agent.step().expect("in-process comm never errors") {
            AgentStep::Continue => continue,
            AgentStep::Terminated(plan) => return plan,
        }
    }
}

#[test]
fn ma_search_agrees_with_single_agent_search_on_the_joined_problem() {
    let instance = factored_instance();
    let optimum = single_agent_optimum(&instance);

    let pool = build_pool(2);
    let plans: Vec<Option<plan_core::Path>> = std::thread::scope(|scope| {
        let instance = &instance;
        let handles: Vec<_> = pool.into_iter().map(|comm| scope.spawn(move || run_agent(instance, comm))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let plan = plans.into_iter().flatten().next().expect("some agent should have assembled a plan");
    assert_eq!(plan.ops.len() as u32, optimum, "MA plan cost should agree with single-agent optimum");
}
