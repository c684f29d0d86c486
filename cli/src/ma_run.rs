//! Runs `args.agents` cooperating `MaAgent`s over one shared, loaded problem, each on its own
//! thread and its own local state pool (§5: no thread shares a pool, no lock spans into a
//! kernel), wired together by an in-process `CommQueue` ring.

use crate::args::{HeurKind, HeurScopeKind, ListKind, MaArgs, PreferredOpsKind};
use crate::heuristic;
use crate::outcome::Outcome;
use plan_core::loader::load_text;
use plan_core::{Instance, Path};
use plan_ma::{comm_queue, scoped_ops, AgentStep, HeurScope, MaAgent};
use plan_search::lazy_list::Backend;
use plan_search::preferred::PreferredOpsPolicy;
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

fn scope_of(kind: HeurScopeKind) -> HeurScope {
    match kind {
        HeurScopeKind::Global => HeurScope::Global,
        HeurScopeKind::Projected => HeurScope::Projected,
        HeurScopeKind::Local => HeurScope::Local,
    }
}

pub fn run(args: &MaArgs) -> anyhow::Result<Outcome> {
    let src = std::fs::read_to_string(&args.problem)?;
    let problem = load_text(&src)?;
    let instance = Instance::build(problem)?;

    let pool = comm_queue::build_pool(args.agents);
    let heur_kind = args.heur;
    let policy = policy_of(args.preferred_ops);
    let backend = backend_of(args.list);
    let scope = scope_of(args.heur_scope);
    let max_time = args.max_time;
    let started = Instant::now();

    let plans: Vec<Option<Path>> = std::thread::scope(|scope_handle| {
        let instance = &instance;
        let handles: Vec<_> = pool
            .into_iter()
            .map(|comm| {
                scope_handle.spawn(move || run_agent(instance, heur_kind, policy, backend, scope, comm, started, max_time))
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("agent thread panicked")).collect()
    });

    let outcome = match plans.into_iter().flatten().next() {
        Some(path) => {
            if let Some(out) = &args.plan_output {
                write_plan(&instance, &path, out)?;
            }
            Outcome::Found(path)
        }
        None => Outcome::NotFound,
    };
    Ok(outcome)
}

#[allow(clippy::too_many_arguments)]
fn run_agent(
    instance: &Instance,
    heur_kind: HeurKind,
    policy: PreferredOpsPolicy,
    backend: Backend,
    scope: HeurScope,
    comm: impl plan_ma::Comm,
    started: Instant,
    max_time: Option<u64>,
) -> Option<Path> {
    let agent_id = comm.id();
    let heur = heuristic::build(heur_kind, instance);
    let heur_ops = scoped_ops(&instance.ops, agent_id, scope);
    let mut agent = MaAgent::new(instance, heur, heur_ops, policy, backend, comm);

    loop {
        if let Some(max_time) = max_time {
            if started.elapsed().as_secs() >= max_time {
                return None;
            }
        }
        match agent.step() {
            Ok(AgentStep::Continue) => continue,
            Ok(AgentStep::Terminated(plan)) => return plan,
            Err(err) => {
                tracing::warn!(agent = agent_id, error = %err, "agent communication failed");
                return None;
            }
        }
    }
}

fn write_plan(instance: &Instance, path: &Path, out: &std::path::Path) -> anyhow::Result<()> {
    let mut text = String::new();
    for op in &path.ops {
        text.push('(');
        text.push_str(&instance.ops.get(*op).name);
        text.push_str(")\n");
    }
    std::fs::write(out, text)?;
    Ok(())
}
