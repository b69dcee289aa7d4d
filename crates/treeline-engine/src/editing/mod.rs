//! The mutable side of the outliner: the source buffer, the per-document
//! outline model with its line-number bookkeeping, structural-change
//! descriptors, and the warning channel.
//!
//! Every dialect's writeback goes through [`model::OutlineModel`]'s edit
//! primitives, which perform a line insertion/deletion and the node
//! index shift as one step, so the shift loop is written exactly once.

pub mod change;
pub mod model;
pub mod warnings;

pub use change::{ChangeRequest, CutPoint, OpKind, Region};
pub use model::{OutlineModel, SourceBuffer};
pub use warnings::{CollectedWarnings, WarningSink};
