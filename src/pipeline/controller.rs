//! Pipeline controller: the single consumer that owns all pipeline state.
//!
//! [`PipelineController`] receives [`PipelineCommand`]s over a
//! `tokio::sync::mpsc` channel and recognition events from its
//! [`CaptureSession`].  Both are handled one at a time on the controller's
//! task, so no state is ever mutated concurrently.
//!
//! # Flow
//!
//! ```text
//! HoldStarted(origin)  └─▶ CaptureSession::start                          [Listening]
//! first live words     └─▶ supersede drafts
//! HoldMoved(point)     └─▶ HoldGesture::track → pending_cancel
//! HoldReleased         └─▶ CaptureSession::stop(pending_cancel)
//!                            ├─ cancelled / blank → [Reviewing] or [Idle]
//!                            └─ transcript → analyze                      [Analyzing]
//! SubmitText(text)     └─▶ analyze                                         [Analyzing]
//!
//! analyze: CategoryStore::list_all → TaxonomyRegistry
//!          SuggestionProvider::suggest_batch
//!            ├─ Ok(non-empty) → DraftReconciler::ingest                   [Reviewing]
//!            └─ Err / empty   → keep transcript and drafts                [Error]
//!
//! CommitAt / CommitOne / CommitAll / EditDraft / Dismiss / AcknowledgeError
//! ```
//!
//! A second analysis request waits in the queue until the first one has
//! finished, then supersedes its drafts.

use std::sync::{Arc, MutexGuard};

use chrono::Utc;
use tokio::sync::mpsc;

use crate::capture::{CaptureError, CaptureSession, HoldGesture, HoldRelease, Point, SessionEvent, SessionUpdate};
use crate::config::AppConfig;
use crate::drafts::{CommitOutcome, CommitReport, Draft, DraftReconciler, ReconcileError};
use crate::store::{CategoryStore, LedgerStore, StoreError};
use crate::suggest::{SuggestError, SuggestionProvider};
use crate::taxonomy::{CategoryResolver, TaxonomyRegistry};

use super::state::{PipelineEvent, PipelineState, PipelineView, SharedView};

// ---------------------------------------------------------------------------
// PipelineCommand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum PipelineCommand {
    HoldStarted(Point),
    HoldMoved(Point),
    HoldReleased,
    SubmitText(String),
    RetryAnalysis,
    EditDraft { index: usize, draft: Draft },
    CommitAt(usize),
    CommitOne(Draft),
    CommitAll,
    Dismiss,
    AcknowledgeError,
    SetLocale(String),
}

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors surfaced by the controller.  `Display` is the user-facing message.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Suggest(#[from] SuggestError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0} is not possible while {1}")]
    Busy(&'static str, &'static str),
}

// ---------------------------------------------------------------------------
// PipelineController
// ---------------------------------------------------------------------------

/// Collaborators handed to [`PipelineController::new`].
pub struct PipelineParts {
    pub session: CaptureSession,
    pub provider: Arc<dyn SuggestionProvider>,
    pub categories: Arc<dyn CategoryStore>,
    pub ledger: Arc<dyn LedgerStore>,
}

pub struct PipelineController {
    view: SharedView,
    session: CaptureSession,
    provider: Arc<dyn SuggestionProvider>,
    categories: Arc<dyn CategoryStore>,
    ledger: Arc<dyn LedgerStore>,
    gesture: HoldGesture,
    reconciler: DraftReconciler,
    state: PipelineState,
}

impl PipelineController {
    pub fn new(view: SharedView, parts: PipelineParts, config: &AppConfig) -> Self {
        Self {
            view,
            session: parts.session,
            provider: parts.provider,
            categories: parts.categories,
            ledger: parts.ledger,
            gesture: HoldGesture::new(config.capture.cancel_radius),
            reconciler: DraftReconciler::new(CategoryResolver::new(
                config.ledger.default_emoji.clone(),
            )),
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn drafts(&self) -> &[Draft] {
        self.reconciler.pending()
    }

    /// Pending drafts together with the categories synthesized for them.
    pub fn reconciler(&self) -> &DraftReconciler {
        &self.reconciler
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until `commands` is closed.  Queued recognition events are always
    /// handled before the next command.
    pub async fn run(mut self, mut commands: mpsc::Receiver<PipelineCommand>) {
        loop {
            tokio::select! {
                biased;
                Some(event) = self.session.next_event() => self.on_recognition(event),
                command = commands.recv() => match command {
                    Some(command) => {
                        if let Err(e) = self.handle(command).await {
                            log::debug!("pipeline: command rejected: {e}");
                        }
                    }
                    None => break,
                },
            }
        }

        log::info!("pipeline: command channel closed, controller shutting down");
    }

    pub async fn handle(&mut self, command: PipelineCommand) -> Result<(), PipelineError> {
        match command {
            PipelineCommand::HoldStarted(origin) => self.begin_hold(origin).await,
            PipelineCommand::HoldMoved(point) => {
                self.drag_hold(point);
                Ok(())
            }
            PipelineCommand::HoldReleased => self.end_hold().await,
            PipelineCommand::SubmitText(text) => self.submit_text(&text).await,
            PipelineCommand::RetryAnalysis => self.retry_analysis().await,
            PipelineCommand::EditDraft { index, draft } => self.edit_draft(index, draft),
            PipelineCommand::CommitAt(index) => self.commit_at(index),
            PipelineCommand::CommitOne(draft) => self.commit_one(&draft),
            PipelineCommand::CommitAll => self.commit_all().map(|_| ()),
            PipelineCommand::Dismiss => self.dismiss(),
            PipelineCommand::AcknowledgeError => {
                self.acknowledge_error();
                Ok(())
            }
            PipelineCommand::SetLocale(locale) => {
                self.session.set_locale(locale);
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Hold gesture and capture
    // -----------------------------------------------------------------------

    pub async fn begin_hold(&mut self, origin: Point) -> Result<(), PipelineError> {
        self.ensure_idle("starting a hold")?;

        self.reconciler.clear_error();
        self.gesture.begin(origin);
        self.transition(PipelineEvent::HoldStarted);
        self.publish();

        if let Err(e) = self.session.start().await {
            self.gesture.release();
            return Err(self.fail(PipelineEvent::CaptureFailed, e.into()));
        }
        Ok(())
    }

    pub fn drag_hold(&mut self, point: Point) {
        if !self.gesture.is_holding() {
            return;
        }
        let was = self.gesture.pending_cancel();
        if self.gesture.track(point) != was {
            self.publish();
        }
    }

    pub async fn end_hold(&mut self) -> Result<(), PipelineError> {
        let Some(release) = self.gesture.release() else {
            return Ok(());
        };
        let cancelled = release == HoldRelease::Cancel;

        match self.session.stop(cancelled).await {
            Err(e) => Err(self.fail(PipelineEvent::CaptureFailed, e.into())),
            Ok(Some(transcript)) if !transcript.trim().is_empty() => {
                self.analyze(&transcript).await
            }
            Ok(_) => {
                log::debug!("pipeline: hold ended without analysis (cancelled: {cancelled})");
                self.transition(PipelineEvent::Discarded {
                    drafts_pending: !self.reconciler.is_empty(),
                });
                self.publish();
                Ok(())
            }
        }
    }

    pub fn on_recognition(&mut self, event: SessionEvent) {
        match self.session.handle(event) {
            SessionUpdate::Stale => {}
            SessionUpdate::Transcript(text) => {
                // The first words heard supersede the batch under review.
                if !text.trim().is_empty() && !self.reconciler.is_empty() {
                    log::debug!("pipeline: live transcript supersedes pending drafts");
                    self.reconciler.on_new_transcript("");
                }
                self.publish();
            }
            SessionUpdate::Failed(e) => {
                if self.state == PipelineState::Listening {
                    self.fail(PipelineEvent::CaptureFailed, e.into());
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    pub async fn submit_text(&mut self, text: &str) -> Result<(), PipelineError> {
        if self.state == PipelineState::Listening {
            return Err(PipelineError::Busy("submitting text", "listening"));
        }
        self.analyze(text).await
    }

    /// Re-run analysis on the transcript kept after an analysis error.
    pub async fn retry_analysis(&mut self) -> Result<(), PipelineError> {
        if self.state != PipelineState::Error {
            return Ok(());
        }
        let transcript = self.reconciler.transcript().to_string();
        self.analyze(&transcript).await
    }

    async fn analyze(&mut self, text: &str) -> Result<(), PipelineError> {
        let text = text.trim();
        if text.is_empty() {
            log::debug!("pipeline: blank input, nothing to analyze");
            return Ok(());
        }

        self.reconciler.set_transcript(text);
        self.reconciler.clear_error();
        self.transition(PipelineEvent::TranscriptReady);
        self.publish();

        let mut taxonomy = match self.categories.list_all() {
            Ok(categories) => TaxonomyRegistry::from_categories(categories),
            Err(e) => return Err(self.fail(PipelineEvent::AnalysisFailed, e.into())),
        };
        let known = taxonomy.names();

        let suggestions = match self.provider.suggest_batch(text, &known).await {
            Ok(suggestions) if suggestions.is_empty() => {
                return Err(self.fail(PipelineEvent::AnalysisFailed, SuggestError::EmptyResult.into()))
            }
            Ok(suggestions) => suggestions,
            Err(e) => return Err(self.fail(PipelineEvent::AnalysisFailed, e.into())),
        };

        self.reconciler.on_new_transcript(text);
        self.reconciler.ingest(&suggestions, &mut taxonomy, Utc::now());
        log::info!(
            "pipeline: {} draft(s) from {} suggestion(s)",
            self.reconciler.pending().len(),
            suggestions.len()
        );
        self.transition(PipelineEvent::Analyzed);
        self.publish();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Review
    // -----------------------------------------------------------------------

    pub fn edit_draft(&mut self, index: usize, draft: Draft) -> Result<(), PipelineError> {
        self.reconciler.edit(index, draft)?;
        self.publish();
        Ok(())
    }

    pub fn commit_at(&mut self, index: usize) -> Result<(), PipelineError> {
        self.ensure_idle("saving")?;
        let outcome = self
            .reconciler
            .commit_at(index, self.categories.as_ref(), self.ledger.as_ref());
        self.after_commit(outcome)
    }

    pub fn commit_one(&mut self, draft: &Draft) -> Result<(), PipelineError> {
        self.ensure_idle("saving")?;
        let outcome = self
            .reconciler
            .commit_one(draft, self.categories.as_ref(), self.ledger.as_ref());
        self.after_commit(outcome)
    }

    pub fn commit_all(&mut self) -> Result<CommitReport, PipelineError> {
        self.ensure_idle("saving")?;
        let report = self
            .reconciler
            .commit_all(self.categories.as_ref(), self.ledger.as_ref());
        log::info!(
            "pipeline: saved {} draft(s), skipped {}, failed {}",
            report.committed,
            report.skipped,
            report.failed
        );
        self.lock_view().last_commit = Some(report);
        self.finish_review();
        Ok(report)
    }

    fn after_commit(
        &mut self,
        outcome: Result<CommitOutcome, ReconcileError>,
    ) -> Result<(), PipelineError> {
        match outcome {
            Ok(CommitOutcome::Completed) => {
                self.finish_review();
                Ok(())
            }
            Ok(CommitOutcome::Pending(_)) => {
                self.publish();
                Ok(())
            }
            Err(e) => {
                log::warn!("pipeline: commit failed: {e}");
                self.reconciler.set_error(e.to_string());
                self.publish();
                Err(e.into())
            }
        }
    }

    fn finish_review(&mut self) {
        self.reconciler.dismiss();
        self.session.clear_error();
        self.transition(PipelineEvent::ReviewFinished);
        self.publish();
    }

    pub fn dismiss(&mut self) -> Result<(), PipelineError> {
        self.ensure_idle("dismissing")?;
        self.reconciler.dismiss();
        self.session.clear_error();
        self.transition(PipelineEvent::Dismissed);
        self.publish();
        Ok(())
    }

    pub fn acknowledge_error(&mut self) {
        self.reconciler.clear_error();
        self.session.clear_error();
        self.transition(PipelineEvent::ErrorAcknowledged {
            drafts_pending: !self.reconciler.is_empty(),
        });
        self.publish();
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn ensure_idle(&self, action: &'static str) -> Result<(), PipelineError> {
        if self.state.is_busy() {
            return Err(PipelineError::Busy(action, self.state.label()));
        }
        Ok(())
    }

    /// Record `error` as the visible message and apply `event`.
    fn fail(&mut self, event: PipelineEvent, error: PipelineError) -> PipelineError {
        log::error!("pipeline error: {error}");
        self.reconciler.set_error(error.to_string());
        self.transition(event);
        self.publish();
        error
    }

    fn transition(&mut self, event: PipelineEvent) {
        let next = self.state.next(event);
        if next != self.state {
            log::debug!("pipeline: {:?} --{:?}--> {:?}", self.state, event, next);
        }
        self.state = next;
    }

    fn lock_view(&self) -> MutexGuard<'_, PipelineView> {
        self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self) {
        let transcript = if self.state == PipelineState::Listening {
            self.session.transcript()
        } else {
            self.reconciler.transcript()
        };

        let mut view = self.lock_view();
        view.phase = self.state;
        view.transcript = transcript.to_string();
        view.drafts = self.reconciler.pending().to_vec();
        view.error_message = self.reconciler.error().map(str::to_string);
        view.pending_cancel = self.gesture.pending_cancel();
        view.pending_categories = self
            .reconciler
            .unpersisted_categories()
            .into_iter()
            .cloned()
            .collect();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{AlwaysGranted, ScriptedAudio, ScriptedRecognizer};
    use crate::pipeline::state::new_shared_view;
    use crate::store::{MemoryCategoryStore, MemoryLedger};
    use crate::suggest::{ScriptedProvider, SegmentingProvider, Suggestion, TransactionType};
    use crate::taxonomy::Category;

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    struct Harness {
        controller: PipelineController,
        view: SharedView,
        provider: Arc<SegmentingProvider<ScriptedProvider>>,
        audio: Arc<ScriptedAudio>,
        categories: Arc<MemoryCategoryStore>,
        ledger: Arc<MemoryLedger>,
        food: Category,
    }

    fn food_expense(amount: f64) -> Suggestion {
        Suggestion::new()
            .with_amount(amount)
            .with_kind(TransactionType::Expense)
            .with_category_name("Food")
    }

    fn make_harness(provider: ScriptedProvider, recognizer: ScriptedRecognizer) -> Harness {
        let food = Category::new("Food", "🍜", "#DD6B20");
        let categories = Arc::new(MemoryCategoryStore::with_categories(vec![food.clone()]));
        let ledger = Arc::new(MemoryLedger::new());
        let provider = Arc::new(SegmentingProvider::new(provider));
        let audio = Arc::new(ScriptedAudio::new());
        let session = CaptureSession::new(
            audio.clone(),
            Arc::new(recognizer),
            Arc::new(AlwaysGranted),
            "en-US",
        );

        let view = new_shared_view();
        let controller = PipelineController::new(
            Arc::clone(&view),
            PipelineParts {
                session,
                provider: provider.clone(),
                categories: categories.clone(),
                ledger: ledger.clone(),
            },
            &AppConfig::default(),
        );

        Harness { controller, view, provider, audio, categories, ledger, food }
    }

    fn text_harness(provider: ScriptedProvider) -> Harness {
        make_harness(provider, ScriptedRecognizer::new())
    }

    // -----------------------------------------------------------------------
    // Text analysis
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn unavailable_provider_segments_and_commits_all() {
        let mut h = text_harness(
            ScriptedProvider::unavailable()
                .on_text("Coffee 35", food_expense(35.0))
                .on_text("Lunch 68", food_expense(68.0)),
        );

        h.controller.submit_text("Coffee 35; Lunch 68").await.unwrap();

        let drafts = h.controller.drafts();
        assert_eq!(drafts.len(), 2);
        assert!(drafts.iter().all(|d| d.category_id == Some(h.food.id)));
        assert_eq!(drafts[0].amount, 35.0);
        assert_eq!(drafts[1].amount, 68.0);
        assert_eq!(h.provider.inner().single_calls(), vec!["Coffee 35", "Lunch 68"]);
        assert_eq!(h.controller.state(), PipelineState::Reviewing);

        let report = h.controller.commit_all().unwrap();
        assert_eq!(report.committed, 2);
        assert_eq!(h.ledger.entries().len(), 2);
        assert!(h.controller.drafts().is_empty());
        assert_eq!(h.controller.state(), PipelineState::Idle);
    }

    #[tokio::test]
    async fn blank_text_is_a_noop() {
        let mut h = text_harness(ScriptedProvider::unavailable().with_batch(vec![food_expense(5.0)]));
        h.controller.submit_text("Taxi 5").await.unwrap();
        assert_eq!(h.controller.drafts().len(), 1);

        h.controller.submit_text("   \n ").await.unwrap();
        assert_eq!(h.provider.inner().total_calls(), 1);
        assert_eq!(h.controller.drafts().len(), 1);
        assert_eq!(h.controller.state(), PipelineState::Reviewing);
    }

    #[tokio::test]
    async fn analysis_error_keeps_transcript_and_drafts() {
        let mut h = text_harness(ScriptedProvider::unavailable().with_batch(vec![food_expense(5.0)]));
        h.controller.submit_text("Taxi 5").await.unwrap();

        // Single segment under a failing provider: the error surfaces.
        let mut failing = text_harness(
            ScriptedProvider::unavailable().with_batch_error(SuggestError::Provider("timeout".into())),
        );
        std::mem::swap(&mut h.controller.provider, &mut failing.controller.provider);

        let err = h.controller.submit_text("Dinner 120").await.unwrap_err();
        assert!(matches!(err, PipelineError::Suggest(SuggestError::Provider(_))));
        assert_eq!(h.controller.state(), PipelineState::Error);
        assert_eq!(h.controller.drafts().len(), 1);

        let view = h.view.lock().unwrap().clone();
        assert_eq!(view.transcript, "Dinner 120");
        assert!(view.error_message.unwrap().contains("timeout"));

        h.controller.acknowledge_error();
        assert_eq!(h.controller.state(), PipelineState::Reviewing);
    }

    #[tokio::test]
    async fn committing_kept_drafts_after_analysis_error_returns_to_idle() {
        let mut h = text_harness(ScriptedProvider::unavailable().with_batch(vec![food_expense(5.0)]));
        h.controller.submit_text("Taxi 5").await.unwrap();

        let mut failing = text_harness(
            ScriptedProvider::unavailable().with_batch_error(SuggestError::Provider("timeout".into())),
        );
        std::mem::swap(&mut h.controller.provider, &mut failing.controller.provider);
        assert!(h.controller.submit_text("Dinner 120").await.is_err());
        assert_eq!(h.controller.state(), PipelineState::Error);

        let report = h.controller.commit_all().unwrap();
        assert_eq!(report.committed, 1);
        assert_eq!(h.controller.state(), PipelineState::Idle);

        let view = h.view.lock().unwrap().clone();
        assert_eq!(view.phase, PipelineState::Idle);
        assert!(view.error_message.is_none());
        assert!(view.drafts.is_empty());
    }

    #[tokio::test]
    async fn committing_last_kept_draft_after_analysis_error_returns_to_idle() {
        let mut h = text_harness(ScriptedProvider::unavailable().with_batch(vec![food_expense(5.0)]));
        h.controller.submit_text("Taxi 5").await.unwrap();

        let mut failing = text_harness(ScriptedProvider::unavailable());
        std::mem::swap(&mut h.controller.provider, &mut failing.controller.provider);
        assert!(h.controller.submit_text("Dinner 120").await.is_err());

        h.controller.commit_at(0).unwrap();
        assert_eq!(h.controller.state(), PipelineState::Idle);
        assert_eq!(h.ledger.entries().len(), 1);
    }

    #[tokio::test]
    async fn all_segments_failing_reports_empty_result() {
        let mut h = text_harness(ScriptedProvider::unavailable());
        let err = h.controller.submit_text("a; b").await.unwrap_err();
        assert!(matches!(err, PipelineError::Suggest(SuggestError::EmptyResult)));
        assert_eq!(h.controller.state(), PipelineState::Error);
    }

    #[tokio::test]
    async fn retry_reruns_preserved_transcript() {
        let mut h = text_harness(ScriptedProvider::unavailable());
        assert!(h.controller.submit_text("Coffee 35").await.is_err());

        let mut working = text_harness(ScriptedProvider::unavailable().on_text("Coffee 35", food_expense(35.0)));
        std::mem::swap(&mut h.controller.provider, &mut working.controller.provider);

        h.controller.retry_analysis().await.unwrap();
        assert_eq!(h.controller.state(), PipelineState::Reviewing);
        assert_eq!(h.controller.drafts()[0].amount, 35.0);
        assert_eq!(working.provider.inner().single_calls(), vec!["Coffee 35"]);
    }

    #[tokio::test]
    async fn new_analysis_supersedes_drafts() {
        let mut h = text_harness(
            ScriptedProvider::unavailable()
                .on_text("Coffee 35", food_expense(35.0))
                .on_text("Lunch 68", food_expense(68.0)),
        );
        h.controller.submit_text("Coffee 35").await.unwrap();
        h.controller.submit_text("Lunch 68").await.unwrap();

        let amounts: Vec<_> = h.controller.drafts().iter().map(|d| d.amount).collect();
        assert_eq!(amounts, vec![68.0]);
    }

    // -----------------------------------------------------------------------
    // Review
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn committing_last_draft_finishes_review() {
        let mut h = text_harness(
            ScriptedProvider::unavailable().with_batch(vec![food_expense(1.0), food_expense(2.0)]),
        );
        h.controller.submit_text("x").await.unwrap();

        h.controller.commit_at(0).unwrap();
        assert_eq!(h.controller.state(), PipelineState::Reviewing);
        let remaining = h.controller.drafts()[0].clone();
        h.controller.commit_one(&remaining).unwrap();

        assert_eq!(h.controller.state(), PipelineState::Idle);
        let view = h.view.lock().unwrap().clone();
        assert!(view.drafts.is_empty());
        assert!(view.transcript.is_empty());
        assert_eq!(h.ledger.entries().len(), 2);
    }

    #[tokio::test]
    async fn synthesized_category_saved_on_commit_only() {
        let mut h = text_harness(ScriptedProvider::unavailable().with_batch(vec![Suggestion::new()
            .with_amount(900.0)
            .with_category_name("Travel")]));

        h.controller.submit_text("Flight 900").await.unwrap();
        assert_eq!(h.categories.list_all().unwrap().len(), 1);
        let pending: Vec<_> = h
            .view
            .lock()
            .unwrap()
            .pending_categories
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(pending, vec!["Travel"]);

        h.controller.commit_at(0).unwrap();
        let names: Vec<_> = h.categories.list_all().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Food", "Travel"]);
    }

    #[tokio::test]
    async fn dismiss_discards_synthesized_category() {
        let mut h = text_harness(ScriptedProvider::unavailable().with_batch(vec![Suggestion::new()
            .with_amount(900.0)
            .with_category_name("Travel")]));
        h.controller.submit_text("Flight 900").await.unwrap();
        h.controller.dismiss().unwrap();

        assert_eq!(h.controller.state(), PipelineState::Idle);
        assert_eq!(h.categories.list_all().unwrap().len(), 1);
        assert!(h.ledger.entries().is_empty());
    }

    #[tokio::test]
    async fn edit_is_published() {
        let mut h = text_harness(ScriptedProvider::unavailable().with_batch(vec![food_expense(35.0)]));
        h.controller.submit_text("Coffee 35").await.unwrap();

        let mut draft = h.controller.drafts()[0].clone();
        draft.note = "with Sam".into();
        h.controller.edit_draft(0, draft).unwrap();
        assert_eq!(h.view.lock().unwrap().drafts[0].note, "with Sam");
    }

    // -----------------------------------------------------------------------
    // Voice
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn released_hold_analyzes_transcript() {
        let mut h = make_harness(
            ScriptedProvider::unavailable().on_text("Coffee 35", food_expense(35.0)),
            ScriptedRecognizer::new().with_partials(["Coffee"]).final_on_finish("Coffee 35"),
        );

        h.controller.begin_hold(Point::new(0.0, 0.0)).await.unwrap();
        assert_eq!(h.controller.state(), PipelineState::Listening);
        h.controller.drag_hold(Point::new(10.0, 10.0));
        h.controller.end_hold().await.unwrap();

        assert_eq!(h.controller.state(), PipelineState::Reviewing);
        assert_eq!(h.controller.drafts()[0].amount, 35.0);
        assert_eq!(h.audio.active_captures(), 0);
    }

    #[tokio::test]
    async fn hold_dragged_past_radius_never_calls_provider() {
        let mut h = make_harness(
            ScriptedProvider::unavailable().otherwise(food_expense(1.0)),
            ScriptedRecognizer::new().with_partials(["Coffee 35"]).final_on_finish("Coffee 35"),
        );

        h.controller.begin_hold(Point::new(0.0, 0.0)).await.unwrap();
        h.controller.drag_hold(Point::new(0.0, 50.0));
        assert!(h.view.lock().unwrap().pending_cancel);
        h.controller.end_hold().await.unwrap();

        assert_eq!(h.provider.inner().total_calls(), 0);
        assert_eq!(h.controller.state(), PipelineState::Idle);
        assert!(h.view.lock().unwrap().transcript.is_empty());
        assert_eq!(h.audio.active_captures(), 0);
    }

    #[tokio::test]
    async fn hold_keeps_drafts_until_words_are_heard() {
        let mut h = make_harness(
            ScriptedProvider::unavailable().with_batch(vec![food_expense(35.0)]),
            ScriptedRecognizer::new().with_partials(["Taxi"]),
        );
        h.controller.submit_text("Coffee 35").await.unwrap();
        h.controller.begin_hold(Point::default()).await.unwrap();
        assert_eq!(h.controller.drafts().len(), 1);

        let event = h.controller.session.next_event().await.unwrap();
        h.controller.on_recognition(event);
        assert!(h.controller.drafts().is_empty());
        assert_eq!(h.view.lock().unwrap().transcript, "Taxi");
    }

    #[tokio::test]
    async fn failed_hold_start_keeps_reviewed_drafts() {
        let mut h = make_harness(
            ScriptedProvider::unavailable().with_batch(vec![food_expense(35.0)]),
            ScriptedRecognizer::new().only_locales(["zh-HK"]),
        );
        h.controller.submit_text("Coffee 35").await.unwrap();

        assert!(h.controller.begin_hold(Point::default()).await.is_err());
        assert_eq!(h.controller.state(), PipelineState::Error);
        assert_eq!(h.controller.drafts().len(), 1);

        h.controller.end_hold().await.unwrap();
        h.controller.acknowledge_error();
        assert_eq!(h.controller.state(), PipelineState::Reviewing);
        assert_eq!(h.view.lock().unwrap().drafts.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_hold_returns_to_review() {
        let mut h = make_harness(
            ScriptedProvider::unavailable().with_batch(vec![food_expense(35.0)]),
            ScriptedRecognizer::new(),
        );
        h.controller.submit_text("Coffee 35").await.unwrap();
        h.controller.begin_hold(Point::new(0.0, 0.0)).await.unwrap();
        h.controller.drag_hold(Point::new(100.0, 0.0));
        h.controller.end_hold().await.unwrap();

        assert_eq!(h.controller.state(), PipelineState::Reviewing);
        assert_eq!(h.controller.drafts().len(), 1);
    }

    #[tokio::test]
    async fn unsupported_locale_fails_hold() {
        let mut h = make_harness(
            ScriptedProvider::unavailable(),
            ScriptedRecognizer::new().only_locales(["zh-HK"]),
        );
        let err = h.controller.begin_hold(Point::default()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Capture(CaptureError::UnsupportedLocale(_))));
        assert_eq!(h.controller.state(), PipelineState::Error);

        // The release that follows is harmless.
        h.controller.end_hold().await.unwrap();
        assert_eq!(h.controller.state(), PipelineState::Error);

        h.controller.acknowledge_error();
        h.controller
            .handle(PipelineCommand::SetLocale("zh-HK".into()))
            .await
            .unwrap();
        h.controller.begin_hold(Point::default()).await.unwrap();
        assert_eq!(h.controller.state(), PipelineState::Listening);
    }

    #[tokio::test]
    async fn text_cannot_be_submitted_while_listening() {
        let mut h = make_harness(ScriptedProvider::unavailable(), ScriptedRecognizer::new());
        h.controller.begin_hold(Point::default()).await.unwrap();
        let err = h.controller.submit_text("Coffee 35").await.unwrap_err();
        assert!(matches!(err, PipelineError::Busy(..)));
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn run_processes_commands_in_order() {
        let h = make_harness(
            ScriptedProvider::unavailable()
                .on_text("Coffee 35", food_expense(35.0))
                .on_text("Taxi 80", food_expense(80.0)),
            ScriptedRecognizer::new().with_partials(["Taxi"]).final_on_finish("Taxi 80"),
        );
        let (tx, rx) = mpsc::channel(16);

        tx.send(PipelineCommand::SubmitText("Coffee 35".into())).await.unwrap();
        tx.send(PipelineCommand::CommitAll).await.unwrap();
        tx.send(PipelineCommand::HoldStarted(Point::default())).await.unwrap();
        tx.send(PipelineCommand::HoldMoved(Point::new(3.0, 4.0))).await.unwrap();
        tx.send(PipelineCommand::HoldReleased).await.unwrap();
        drop(tx);

        h.controller.run(rx).await;

        let view = h.view.lock().unwrap().clone();
        assert_eq!(view.phase, PipelineState::Reviewing);
        assert_eq!(view.transcript, "Taxi 80");
        assert_eq!(view.drafts.len(), 1);
        assert_eq!(view.drafts[0].amount, 80.0);
        assert_eq!(view.last_commit.map(|r| r.committed), Some(1));
        assert_eq!(h.ledger.entries()[0].amount, 35.0);
        assert_eq!(h.audio.active_captures(), 0);
    }

    #[tokio::test]
    async fn recognition_failure_during_hold_moves_to_error() {
        let h = make_harness(ScriptedProvider::unavailable(), ScriptedRecognizer::new());
        let mut controller = h.controller;
        controller.begin_hold(Point::default()).await.unwrap();

        // Simulate the recognizer thread failing mid-utterance.
        let generation_event = SessionEvent {
            generation: 1,
            event: crate::capture::RecognitionEvent::Failure("stream broke".into()),
        };
        controller.on_recognition(generation_event);

        assert_eq!(controller.state(), PipelineState::Error);
        assert_eq!(h.audio.active_captures(), 0);
        assert!(h.view.lock().unwrap().error_message.as_deref().unwrap().contains("stream broke"));

        controller.end_hold().await.unwrap();
        assert_eq!(controller.state(), PipelineState::Error);
    }
}
