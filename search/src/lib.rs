//! Search kernels and their shared plumbing: open lists, a priority queue, and the per-state
//! bookkeeping context every kernel (EHC, lazy best-first, A*) drives through `step()`.

pub mod astar;
pub mod ehc;
pub mod kernel;
pub mod lazy_bfs;
pub mod lazy_list;
pub mod preferred;
pub mod priority;

pub use astar::AStar;
pub use ehc::Ehc;
pub use kernel::{Context, SearchStats, Step};
pub use lazy_bfs::LazyBfs;
pub use lazy_list::{Backend, Entry, LazyOpenList};
pub use plan_core::Path;
pub use preferred::PreferredOpsPolicy;
pub use priority::BucketQueue;
