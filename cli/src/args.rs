//! Command-line surface: a `solve` subcommand running one search kernel over a single problem,
//! and an `ma` subcommand running several cooperating agents over a shared problem in-process.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "plan", version, about = "A finite-domain classical and multi-agent planner.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Logging level: one of "error", "warn", "info", "debug", "trace".
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single search kernel against one problem.
    Solve(SolveArgs),
    /// Run several cooperating agents over a shared problem.
    Ma(MaArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    /// Path to a problem file in the `plan_core::loader` text format.
    #[arg(long)]
    pub problem: PathBuf,

    #[arg(long, value_enum, default_value_t = SearchKind::Lazy)]
    pub search: SearchKind,

    #[arg(long, value_enum, default_value_t = ListKind::Heap)]
    pub list: ListKind,

    #[arg(long, value_enum, default_value_t = HeurKind::Add)]
    pub heur: HeurKind,

    #[arg(long = "preferred-ops", value_enum, default_value_t = PreferredOpsKind::Off)]
    pub preferred_ops: PreferredOpsKind,

    /// Apply pathmax propagation. Only meaningful with `--search astar`.
    #[arg(long)]
    pub pathmax: bool,

    /// Write the found plan (one operator name per line) to this file.
    #[arg(long = "plan-output")]
    pub plan_output: Option<PathBuf>,

    /// Abort the search after this many seconds of wall-clock time.
    #[arg(long = "max-time")]
    pub max_time: Option<u64>,

    /// Abort the search once the process's resident set size exceeds this many megabytes.
    #[arg(long = "max-mem")]
    pub max_mem: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct MaArgs {
    /// Path to the shared problem file every agent plans over.
    #[arg(long)]
    pub problem: PathBuf,

    /// Number of cooperating agents to run in-process.
    #[arg(long, default_value_t = 2)]
    pub agents: u32,

    #[arg(long, value_enum, default_value_t = HeurKind::Add)]
    pub heur: HeurKind,

    #[arg(long = "heur-scope", value_enum, default_value_t = HeurScopeKind::Global)]
    pub heur_scope: HeurScopeKind,

    #[arg(long = "preferred-ops", value_enum, default_value_t = PreferredOpsKind::Off)]
    pub preferred_ops: PreferredOpsKind,

    #[arg(long, value_enum, default_value_t = ListKind::Heap)]
    pub list: ListKind,

    #[arg(long = "plan-output")]
    pub plan_output: Option<PathBuf>,

    #[arg(long = "max-time")]
    pub max_time: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Ehc,
    Lazy,
    Astar,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Fifo,
    Bucket,
    Heap,
    #[value(name = "rbtree")]
    RbTree,
    #[value(name = "splaytree")]
    SplayTree,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeurKind {
    #[value(name = "goalcount")]
    GoalCount,
    Add,
    Max,
    Ff,
    #[value(name = "lm-cut")]
    LmCut,
    Flow,
    #[value(name = "flow-ilp")]
    FlowIlp,
    #[value(name = "flow-lm-cut")]
    FlowLmCut,
    Pot,
    #[value(name = "pot-all-synt-states")]
    PotAllSyntStates,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredOpsKind {
    Off,
    Pref,
    Only,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeurScopeKind {
    Global,
    Projected,
    Local,
}
