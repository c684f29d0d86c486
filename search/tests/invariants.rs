//! End-to-end invariants from the search kernels' point of view: admissibility, A* optimality,
//! dead-end safety, and an A*+LM-Cut scenario in the spirit of T1/T2 but over a small synthetic
//! factored problem built with `plan_core::loader`, since the named IPC benchmark files are
//! produced by an out-of-scope PDDL grounder.

use plan_core::loader::load_text;
use plan_core::Instance;
use plan_heuristics::{AddHeuristic, Heuristic, LmCutHeuristic, MaxHeuristic};
use plan_search::astar::AStar;
use plan_search::ehc::Ehc;
use plan_search::kernel::Step;
use plan_search::preferred::PreferredOpsPolicy;

/// Two independent chains of length 3 and 4 that must both be walked to completion, so the
/// optimal cost (7) is neither chain's length alone.
fn two_chain_instance() -> Instance {
    let src = "
        var a 4
        var b 5
        init 0 0
        op a1 1
        pre 0 0
        eff 0 1
        op a2 1
        pre 0 1
        eff 0 2
        op a3 1
        pre 0 2
        eff 0 3
        op b1 1
        pre 1 0
        eff 1 1
        op b2 1
        pre 1 1
        eff 1 2
        op b3 1
        pre 1 2
        eff 1 3
        op b4 1
        pre 1 3
        eff 1 4
        goal 0 3
        goal 1 4
    ";
    Instance::build(load_text(src).unwrap()).unwrap()
}

fn optimal_cost(instance: &Instance) -> u32 {
    let mut astar = AStar::new(instance, AddHeuristic, PreferredOpsPolicy::None, false);
    loop {
        match astar.step() {
            Step::Found(path) => return path.cost(&instance.ops),
            Step::Continue => continue,
            other => panic!("unexpected: {other:?}"),
        }
    }
}

/// Invariant 6 (admissibility): `h(s) <= plan_cost(s)` on the initial state, for max and LM-Cut.
#[test]
fn admissible_heuristics_never_overestimate() {
    let instance = two_chain_instance();
    let optimum = optimal_cost(&instance);

    let mut max = MaxHeuristic;
    let h_max = max
        .evaluate(&instance.vars, &instance.ops, &instance.goal, &instance.init)
        .h;
    assert!(h_max <= optimum, "h_max={h_max} > optimum={optimum}");

    let mut lmcut = LmCutHeuristic::default();
    let h_lmcut = lmcut
        .evaluate(&instance.vars, &instance.ops, &instance.goal, &instance.init)
        .h;
    assert!(h_lmcut <= optimum, "h_lmcut={h_lmcut} > optimum={optimum}");
}

/// Invariant 8 (A* optimality): with an admissible heuristic the returned plan's cost is the
/// known optimum, here 7 (3-step chain `a` plus 4-step chain `b`, interleaved in any order).
#[test]
fn astar_with_lm_cut_returns_the_known_optimum() {
    let instance = two_chain_instance();
    let mut astar = AStar::new(&instance, LmCutHeuristic::default(), PreferredOpsPolicy::None, false);
    let path = loop {
        match astar.step() {
            Step::Found(path) => break path,
            Step::Continue => continue,
            other => panic!("unexpected: {other:?}"),
        }
    };
    assert_eq!(path.cost(&instance.ops), 7);
}

/// Invariant 8 with pathmax enabled: pathmax only tightens `f`, it must never change the
/// optimal cost A* reports.
#[test]
fn astar_with_pathmax_returns_the_same_optimum_as_without() {
    let instance = two_chain_instance();
    let mut astar = AStar::new(&instance, LmCutHeuristic::default(), PreferredOpsPolicy::None, true);
    let path = loop {
        match astar.step() {
            Step::Found(path) => break path,
            Step::Continue => continue,
            other => panic!("unexpected: {other:?}"),
        }
    };
    assert_eq!(path.cost(&instance.ops), 7);
}

/// Invariant 9 (dead-end safety): a heuristic reporting `DEAD_END` on the initial state must
/// mean the goal is genuinely unreachable, confirmed here by exhausting EHC's local search.
#[test]
fn dead_end_heuristic_implies_no_plan_exists() {
    let src = "
        var a 2
        init 0
        goal 0 1
    ";
    let instance = Instance::build(load_text(src).unwrap()).unwrap();
    let values = instance.init.clone();
    let estimate = AddHeuristic.evaluate(&instance.vars, &instance.ops, &instance.goal, &values);
    assert!(estimate.is_dead_end());

    let mut ehc = Ehc::new(&instance, AddHeuristic, PreferredOpsPolicy::None);
    assert!(matches!(ehc.step(), Step::NotFound));
}
