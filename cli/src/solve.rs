//! Drives a single search kernel against one problem, honoring `--max-time`/`--max-mem` as
//! cooperative abort checks between `step()` calls (§5: kernels never get preempted mid-expand).

use crate::args::{ListKind, PreferredOpsKind, SearchKind, SolveArgs};
use crate::outcome::Outcome;
use crate::{heuristic, mem};
use plan_core::loader::load_text;
use plan_core::Instance;
use plan_search::kernel::Step;
use plan_search::lazy_list::Backend;
use plan_search::preferred::PreferredOpsPolicy;
use plan_search::{AStar, Ehc, LazyBfs};
use std::time::Instant;

fn backend_of(kind: ListKind) -> Backend {
    match kind {
        ListKind::Fifo => Backend::Fifo,
        ListKind::Bucket => Backend::Bucket,
        ListKind::Heap => Backend::Heap,
        ListKind::RbTree => Backend::RbTree,
        ListKind::SplayTree => Backend::SplayTree,
    }
}

fn policy_of(kind: PreferredOpsKind) -> PreferredOpsPolicy {
    match kind {
        PreferredOpsKind::Off => PreferredOpsPolicy::None,
        PreferredOpsKind::Pref => PreferredOpsPolicy::Prefer,
        PreferredOpsKind::Only => PreferredOpsPolicy::Only,
    }
}

enum Kernel<'a> {
    Ehc(Ehc<'a, Box<dyn plan_heuristics::Heuristic>>),
    Lazy(LazyBfs<'a, Box<dyn plan_heuristics::Heuristic>>),
    AStar(AStar<'a, Box<dyn plan_heuristics::Heuristic>>),
}

impl<'a> Kernel<'a> {
    fn step(&mut self) -> Step {
        match self {
            Kernel::Ehc(k) => k.step(),
            Kernel::Lazy(k) => k.step(),
            Kernel::AStar(k) => k.step(),
        }
    }

    fn stats(&self) -> &plan_search::kernel::SearchStats {
        match self {
            Kernel::Ehc(k) => k.stats(),
            Kernel::Lazy(k) => k.stats(),
            Kernel::AStar(k) => k.stats(),
        }
    }
}

pub fn run(args: &SolveArgs) -> anyhow::Result<Outcome> {
    let src = std::fs::read_to_string(&args.problem)?;
    let problem = load_text(&src)?;
    let instance = Instance::build(problem)?;

    let heur = heuristic::build(args.heur, &instance);
    let policy = policy_of(args.preferred_ops);
    let mut kernel = match args.search {
        SearchKind::Ehc => Kernel::Ehc(Ehc::new(&instance, heur, policy)),
        SearchKind::Lazy => Kernel::Lazy(LazyBfs::new(&instance, heur, policy, backend_of(args.list))),
        SearchKind::Astar => Kernel::AStar(AStar::new(&instance, heur, policy, args.pathmax)),
    };

    let started = Instant::now();
    let outcome = loop {
        if let Some(max_time) = args.max_time {
            if started.elapsed().as_secs() >= max_time {
                break Outcome::MaxTime;
            }
        }
        if let Some(max_mem) = args.max_mem {
            if mem::peak_rss_mb() >= max_mem {
                break Outcome::MaxMemory;
            }
        }
        match kernel.step() {
            Step::Continue => continue,
            Step::Found(path) => break Outcome::Found(path),
            Step::NotFound => break Outcome::NotFound,
            Step::Abort(reason) => break Outcome::Aborted(reason),
        }
    };

    let stats = kernel.stats();
    tracing::info!(
        expanded = stats.expanded,
        generated = stats.generated,
        evaluated = stats.evaluated,
        dead_ends = stats.dead_ends,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "search finished"
    );

    if let (Outcome::Found(path), Some(out)) = (&outcome, &args.plan_output) {
        write_plan(&instance, path, out)?;
    }

    Ok(outcome)
}

fn write_plan(instance: &Instance, path: &plan_core::Path, out: &std::path::Path) -> anyhow::Result<()> {
    let mut text = String::new();
    for op in &path.ops {
        text.push('(');
        text.push_str(&instance.ops.get(*op).name);
        text.push_str(")\n");
    }
    std::fs::write(out, text)?;
    Ok(())
}
