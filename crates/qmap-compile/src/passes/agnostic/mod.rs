//! Target-agnostic optimization passes.
//!
//! These passes only rewrite gate sequences; they never consult the
//! architecture graph and are safe to run on logical and physical circuits
//! alike, subject to each pass's own precondition.

pub mod optimization;

pub use optimization::{
    CancelInverses, Cleanup, FoldSwaps, MergeRotations, PhaseGadget, RemoveIdentity,
};
