//! Stale draft rejection.
//!
//! Finds stored specs whose status is still draft-like long after their
//! document last changed, flips the status cell in the document to
//! "Rejected", and leaves a notice for readers of the document.

pub mod error;
pub mod locate;
pub mod mutate;
pub mod runner;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::RejectError;
pub use runner::{new_cleanup_id, RejectService};
pub use types::{NoticeKind, RejectConfig, RejectOutcome, RejectReport};
