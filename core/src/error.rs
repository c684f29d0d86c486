//! Error kinds per the planner's error-handling design: explicit values, never exceptions.

use thiserror::Error;

/// A variable's range does not fit in one packer word.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("variable needs {needed} bits but a packer word only has {word_bits}")]
pub struct LayoutError {
    pub needed: u32,
    pub word_bits: u32,
}

/// Attempted an inconsistent state-space transition (e.g. closing a `New` node, or reopening a
/// `Closed` node with a `g` that is not strictly smaller). Returned to the caller; never
/// corrupts the state space.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid state-space transition")]
pub struct WrongState;

/// Top-level error type for the ambient load/search/MA-comm failure paths described in the
/// error-handling design. Heuristic infeasibility is deliberately not a variant here: it is
/// recovered locally as `DEAD_END` and never propagated as an `Err`.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("malformed problem input: {0}")]
    Load(String),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("search aborted: {0}")]
    SearchAbort(String),

    #[error("communication channel closed")]
    CommClosed,

    #[error("communication timed out")]
    CommTimeout,
}
