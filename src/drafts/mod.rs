//! Draft normalization and the pending-draft lifecycle.
//!
//! * [`Draft`]: normalized proposal with a structural identity.
//! * [`DraftReconciler`]: owns the pending list; ingest, edit, commit,
//!   dismiss.

pub mod draft;
pub mod reconciler;

pub use draft::{Draft, DraftIdentity};
pub use reconciler::{CommitOutcome, CommitReport, DraftReconciler};

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Choose a category before saving")]
    Unresolved,

    #[error("Enter an amount before saving")]
    ZeroAmount,

    #[error("Draft is no longer pending")]
    NotPending,

    #[error("An identical draft is already pending")]
    DuplicateDraft,

    #[error(transparent)]
    Store(#[from] StoreError),
}
