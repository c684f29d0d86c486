//! Builds the `Box<dyn Heuristic>` named by `--heur`/`--heur-scope`.

use crate::args::HeurKind;
use plan_core::Instance;
use plan_heuristics::{
    flow::FlowOptions, AddHeuristic, FfHeuristic, FlowHeuristic, GoalCountHeuristic, Heuristic, LmCutHeuristic,
    MaxHeuristic, PotHeuristic,
};

/// Above this many syntactic states, `pot-all-synt-states` falls back to sampling only the
/// initial state rather than materializing a combinatorial explosion of unreachable states.
const MAX_SYNTHETIC_SAMPLES: usize = 200_000;

pub fn build(kind: HeurKind, instance: &Instance) -> Box<dyn Heuristic> {
    match kind {
        HeurKind::GoalCount => Box::new(GoalCountHeuristic),
        HeurKind::Add => Box::new(AddHeuristic),
        HeurKind::Max => Box::new(MaxHeuristic),
        HeurKind::Ff => Box::new(FfHeuristic),
        HeurKind::LmCut => Box::new(LmCutHeuristic::default()),
        HeurKind::Flow => Box::new(FlowHeuristic::new(FlowOptions::default())),
        HeurKind::FlowIlp => Box::new(FlowHeuristic::new(FlowOptions { lm_cut_rows: false, integral: true })),
        HeurKind::FlowLmCut => Box::new(FlowHeuristic::new(FlowOptions { lm_cut_rows: true, integral: false })),
        HeurKind::Pot => Box::new(PotHeuristic::new(&instance.vars, &instance.ops, &instance.goal, &[instance.init.clone()])),
        HeurKind::PotAllSyntStates => {
            let samples = synthetic_states(instance);
            Box::new(PotHeuristic::new(&instance.vars, &instance.ops, &instance.goal, &samples))
        }
    }
}

fn synthetic_states(instance: &Instance) -> Vec<Vec<u32>> {
    let ranges: Vec<u32> = instance.vars.iter().map(|(_, v)| v.range).collect();
    let total: u64 = ranges.iter().map(|&r| r as u64).product();
    if total == 0 || total as usize > MAX_SYNTHETIC_SAMPLES {
        tracing::warn!(total, "too many syntactic states, sampling only the initial state");
        return vec![instance.init.clone()];
    }
    let mut states = vec![Vec::with_capacity(ranges.len())];
    for &range in &ranges {
        let mut next = Vec::with_capacity(states.len() * range as usize);
        for prefix in &states {
            for val in 0..range {
                let mut state = prefix.clone();
                state.push(val);
                next.push(state);
            }
        }
        states = next;
    }
    states
}
