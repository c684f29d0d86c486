//! Multi-agent search extension (§4.8): a `Comm` transport abstraction, the inter-agent wire
//! schema, and the per-agent kernel (public-state exchange, distributed snapshot, path tracing,
//! and ring-based termination) that lets several cooperating search threads converge on a single
//! globally optimal plan without ever sharing a state pool.

pub mod agent;
pub mod comm;
pub mod comm_queue;
pub mod comm_tcp;
pub mod message;
pub mod scope;
pub mod snapshot;
pub mod terminate;
pub mod trace;

pub use agent::{AgentStep, MaAgent};
pub use comm::{Comm, CommError};
pub use message::Message;
pub use scope::{scoped_ops, HeurScope};
