//! Small index-oriented collection building blocks shared by the planner crates.
//!
//! Every planning-specific identifier (`StateID`, `Op`, `AttrId`, ...) is a thin `usize` newtype.
//! The types here let the rest of the workspace treat "a dense integer key" as a first-class
//! storage address instead of reaching for generic hash maps everywhere.

pub mod ref_store;
pub mod segmented;
