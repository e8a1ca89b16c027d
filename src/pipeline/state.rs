//! Pipeline state machine and the shared read model.
//!
//! [`PipelineState`] is driven by the controller through the pure
//! [`PipelineState::next`].  Front ends read [`PipelineView`] via
//! [`SharedView`]; only the controller writes it.

use std::sync::{Arc, Mutex};

use crate::drafts::{CommitReport, Draft};
use crate::taxonomy::Category;

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// Phases of the voice/text → draft pipeline.
///
/// ```text
/// Idle / Reviewing / Error ──HoldStarted──▶ Listening
/// Listening ──Discarded──▶ Reviewing if drafts remain, else Idle
///                                            (cancel, or nothing heard)
/// Listening ──CaptureFailed──▶ Error
/// Idle / Listening / Reviewing / Error ──TranscriptReady──▶ Analyzing
/// Analyzing ──Analyzed──▶ Reviewing
/// Analyzing ──AnalysisFailed──▶ Error
/// Reviewing / Error ──ReviewFinished──▶ Idle (last draft committed, commit all)
/// Reviewing / Error ──Dismissed──▶ Idle
/// Error ──ErrorAcknowledged──▶ Reviewing if drafts remain, else Idle
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PipelineState {
    #[default]
    Idle,
    Listening,
    Analyzing,
    /// Drafts are pending review.
    Reviewing,
    /// A recoverable error; the message is in [`PipelineView::error_message`].
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    HoldStarted,
    Discarded { drafts_pending: bool },
    CaptureFailed,
    TranscriptReady,
    Analyzed,
    AnalysisFailed,
    ReviewFinished,
    Dismissed,
    ErrorAcknowledged { drafts_pending: bool },
}

impl PipelineState {
    pub fn next(self, event: PipelineEvent) -> Self {
        use PipelineEvent as E;
        use PipelineState as S;

        match (self, event) {
            (S::Idle | S::Reviewing | S::Error, E::HoldStarted) => S::Listening,
            (S::Listening, E::Discarded { drafts_pending: true }) => S::Reviewing,
            (S::Listening, E::Discarded { drafts_pending: false }) => S::Idle,
            (S::Listening, E::CaptureFailed) => S::Error,
            (S::Idle | S::Listening | S::Reviewing | S::Error, E::TranscriptReady) => S::Analyzing,
            (S::Analyzing, E::Analyzed) => S::Reviewing,
            (S::Analyzing, E::AnalysisFailed) => S::Error,
            (S::Reviewing | S::Error, E::ReviewFinished) => S::Idle,
            (S::Reviewing | S::Error, E::Dismissed) => S::Idle,
            (S::Error, E::ErrorAcknowledged { drafts_pending: true }) => S::Reviewing,
            (S::Error, E::ErrorAcknowledged { drafts_pending: false }) => S::Idle,
            (state, _) => state,
        }
    }

    /// `true` while capture or analysis is in progress.
    ///
    /// ```
    /// use voice_ledger::pipeline::PipelineState;
    ///
    /// assert!(!PipelineState::Idle.is_busy());
    /// assert!(PipelineState::Listening.is_busy());
    /// assert!(PipelineState::Analyzing.is_busy());
    /// assert!(!PipelineState::Reviewing.is_busy());
    /// assert!(!PipelineState::Error.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, PipelineState::Listening | PipelineState::Analyzing)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Listening => "Listening",
            PipelineState::Analyzing => "Analyzing",
            PipelineState::Reviewing => "Review",
            PipelineState::Error => "Error",
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineView
// ---------------------------------------------------------------------------

/// Everything a front end needs to render the pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineView {
    pub phase: PipelineState,
    /// Live transcript while listening, analyzed text afterwards.
    pub transcript: String,
    pub drafts: Vec<Draft>,
    pub error_message: Option<String>,
    /// The hold has been dragged past the cancel radius.
    pub pending_cancel: bool,
    /// Categories synthesized for the pending drafts and not yet stored.
    pub pending_categories: Vec<Category>,
    pub last_commit: Option<CommitReport>,
}

/// Do not hold the lock across `.await` points.
pub type SharedView = Arc<Mutex<PipelineView>>;

pub fn new_shared_view() -> SharedView {
    Arc::new(Mutex::new(PipelineView::default()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineEvent as E;
    use PipelineState as S;

    #[test]
    fn voice_round_trip() {
        let s = S::Idle.next(E::HoldStarted);
        assert_eq!(s, S::Listening);
        let s = s.next(E::TranscriptReady);
        assert_eq!(s, S::Analyzing);
        let s = s.next(E::Analyzed);
        assert_eq!(s, S::Reviewing);
        assert_eq!(s.next(E::ReviewFinished), S::Idle);
    }

    #[test]
    fn cancelled_hold_returns_to_idle() {
        assert_eq!(S::Listening.next(E::Discarded { drafts_pending: false }), S::Idle);
    }

    #[test]
    fn cancelled_hold_returns_to_pending_review() {
        assert_eq!(S::Listening.next(E::Discarded { drafts_pending: true }), S::Reviewing);
    }

    #[test]
    fn committing_kept_drafts_leaves_error() {
        assert_eq!(S::Error.next(E::ReviewFinished), S::Idle);
        assert_eq!(S::Analyzing.next(E::ReviewFinished), S::Analyzing);
    }

    #[test]
    fn no_hold_while_analyzing() {
        assert_eq!(S::Analyzing.next(E::HoldStarted), S::Analyzing);
        assert_eq!(S::Listening.next(E::HoldStarted), S::Listening);
    }

    #[test]
    fn analysis_only_once_at_a_time() {
        assert_eq!(S::Analyzing.next(E::TranscriptReady), S::Analyzing);
    }

    #[test]
    fn errors_and_recovery() {
        assert_eq!(S::Listening.next(E::CaptureFailed), S::Error);
        assert_eq!(S::Analyzing.next(E::AnalysisFailed), S::Error);
        assert_eq!(S::Error.next(E::ErrorAcknowledged { drafts_pending: true }), S::Reviewing);
        assert_eq!(S::Error.next(E::ErrorAcknowledged { drafts_pending: false }), S::Idle);
        assert_eq!(S::Error.next(E::TranscriptReady), S::Analyzing);
    }

    #[test]
    fn dismiss_from_review_or_error() {
        assert_eq!(S::Reviewing.next(E::Dismissed), S::Idle);
        assert_eq!(S::Error.next(E::Dismissed), S::Idle);
        assert_eq!(S::Analyzing.next(E::Dismissed), S::Analyzing);
    }

    #[test]
    fn labels() {
        assert_eq!(S::Reviewing.label(), "Review");
        assert_eq!(S::default(), S::Idle);
    }

    #[test]
    fn shared_view_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedView>();
    }
}
