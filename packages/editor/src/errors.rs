//! Error types for the editor

use thiserror::Error;

use crate::patch::PatchId;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Patch error: {0}")]
    Patch(#[from] crate::patch::PatchError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Storage error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Proposal error: {0}")]
    Proposal(#[from] crate::proposal::ProposalError),
}

/// Misuse of the review state machine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("A review is already open")]
    ReviewInProgress,

    #[error("No review is open")]
    NoReview,

    #[error("Unknown patch: {0}")]
    UnknownPatch(PatchId),

    #[error("Patch {0} is already resolved")]
    AlreadyResolved(PatchId),

    #[error("Patch {0} does not target a whole page")]
    NotPageLevel(PatchId),

    /// Earlier operations the patch was positioned against are still pending
    /// or were rejected, so its path now lands on another entity
    #[error("Patch {id} was reviewed against {expected:?} but would now change {found:?}")]
    TargetMoved {
        id: PatchId,
        expected: Option<String>,
        found: Option<String>,
    },

    #[error(transparent)]
    Patch(#[from] crate::patch::PatchError),
}
