//! Pending-draft lifecycle: ingest, edit, commit and dismiss.
//!
//! ```text
//!  suggestions ──ingest──▶ pending [d0, d1, ...] ──commit_one / commit_at──▶ LedgerStore
//!                               │  ▲                 commit_all
//!                       dismiss │  │ edit
//!                               ▼  │
//!                             (empty)
//! ```
//!
//! Every ingest supersedes the previous batch.  Categories synthesized while
//! resolving a batch are held here, unpersisted, until the first committed
//! draft that references one; they are written to the [`CategoryStore`]
//! right before that draft's ledger write and are dropped with the batch
//! otherwise.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::store::{CategoryStore, LedgerStore};
use crate::suggest::Suggestion;
use crate::taxonomy::{Category, CategoryId, CategoryResolver, Resolution, TaxonomyRegistry};

use super::draft::Draft;
use super::ReconcileError;

/// Result of committing a single draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Drafts remain pending.
    Pending(usize),
    /// The pending list is now empty.
    Completed,
}

/// Tally of a [`DraftReconciler::commit_all`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub committed: usize,
    /// Drafts without a category.
    pub skipped: usize,
    /// Drafts the stores rejected.
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct DraftReconciler {
    resolver: CategoryResolver,
    pending: Vec<Draft>,
    synthesized: HashMap<CategoryId, Category>,
    transcript: String,
    error: Option<String>,
}

impl DraftReconciler {
    pub fn new(resolver: CategoryResolver) -> Self {
        Self {
            resolver,
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn pending(&self) -> &[Draft] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Synthesized categories referenced by the current batch and not yet
    /// written to the category store.
    pub fn unpersisted_categories(&self) -> Vec<&Category> {
        let mut categories: Vec<_> = self.synthesized.values().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    // -----------------------------------------------------------------------
    // Transient review state
    // -----------------------------------------------------------------------

    pub fn set_transcript(&mut self, transcript: impl Into<String>) {
        self.transcript = transcript.into();
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Drop the pending batch and any error ahead of a new transcript.
    pub fn on_new_transcript(&mut self, transcript: impl Into<String>) {
        self.pending.clear();
        self.synthesized.clear();
        self.error = None;
        self.transcript = transcript.into();
    }

    // -----------------------------------------------------------------------
    // Ingest
    // -----------------------------------------------------------------------

    /// Replace the pending list with drafts normalized from `suggestions`.
    ///
    /// Categories are resolved in order against `taxonomy`, so a category
    /// synthesized for one suggestion is matched by the next.  A draft
    /// structurally equal to an earlier one in the batch is dropped.
    pub fn ingest(
        &mut self,
        suggestions: &[Suggestion],
        taxonomy: &mut TaxonomyRegistry,
        now: DateTime<Utc>,
    ) -> &[Draft] {
        self.pending.clear();
        self.synthesized.clear();

        let mut seen = HashSet::new();
        for suggestion in suggestions {
            let resolution = self.resolver.resolve(suggestion, taxonomy);
            let category_id = resolution.category_id();
            if let Resolution::Synthesized(category) = resolution {
                self.synthesized.insert(category.id, category);
            }

            let draft = Draft::from_suggestion(suggestion, category_id, now);
            if !seen.insert(draft.identity()) {
                log::debug!("drafts: dropped duplicate of {:.2}", draft.amount);
                continue;
            }
            self.pending.push(draft);
        }

        log::debug!(
            "drafts: ingested {} suggestion(s) into {} draft(s)",
            suggestions.len(),
            self.pending.len()
        );
        &self.pending
    }

    // -----------------------------------------------------------------------
    // Edit
    // -----------------------------------------------------------------------

    /// Replace the pending draft at `index`.
    pub fn edit(&mut self, index: usize, draft: Draft) -> Result<(), ReconcileError> {
        if index >= self.pending.len() {
            return Err(ReconcileError::NotPending);
        }
        let collides = self
            .pending
            .iter()
            .enumerate()
            .any(|(i, other)| i != index && other.same_identity(&draft));
        if collides {
            return Err(ReconcileError::DuplicateDraft);
        }
        self.pending[index] = draft;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------------

    /// Write `draft` to the ledger and remove the first structurally equal
    /// pending entry.  Drafts without a category or with a zero amount are
    /// refused and stay pending.
    pub fn commit_one(
        &mut self,
        draft: &Draft,
        categories: &dyn CategoryStore,
        ledger: &dyn LedgerStore,
    ) -> Result<CommitOutcome, ReconcileError> {
        if !self.pending.iter().any(|p| p.same_identity(draft)) {
            return Err(ReconcileError::NotPending);
        }
        let transaction = draft.to_transaction()?;
        if transaction.amount <= 0.0 {
            return Err(ReconcileError::ZeroAmount);
        }

        self.persist_synthesized(transaction.category_id, categories)?;
        ledger.create(&transaction)?;
        remove_first_match(&mut self.pending, draft);

        if self.pending.is_empty() {
            self.synthesized.clear();
            log::debug!("drafts: batch completed");
            Ok(CommitOutcome::Completed)
        } else {
            Ok(CommitOutcome::Pending(self.pending.len()))
        }
    }

    /// [`commit_one`](Self::commit_one) for the draft at `index`.
    pub fn commit_at(
        &mut self,
        index: usize,
        categories: &dyn CategoryStore,
        ledger: &dyn LedgerStore,
    ) -> Result<CommitOutcome, ReconcileError> {
        let draft = self
            .pending
            .get(index)
            .cloned()
            .ok_or(ReconcileError::NotPending)?;
        self.commit_one(&draft, categories, ledger)
    }

    /// Commit every resolved draft in order, then clear the pending list.
    ///
    /// Unresolved drafts are skipped.  A store failure on one draft is
    /// logged and counted; the remaining drafts are still attempted.
    pub fn commit_all(
        &mut self,
        categories: &dyn CategoryStore,
        ledger: &dyn LedgerStore,
    ) -> CommitReport {
        let mut report = CommitReport::default();
        let drafts = std::mem::take(&mut self.pending);

        for draft in &drafts {
            let transaction = match draft.to_transaction() {
                Ok(t) => t,
                Err(_) => {
                    report.skipped += 1;
                    continue;
                }
            };
            let written = self
                .persist_synthesized(transaction.category_id, categories)
                .and_then(|_| ledger.create(&transaction).map_err(ReconcileError::from));
            match written {
                Ok(()) => report.committed += 1,
                Err(e) => {
                    log::warn!("drafts: commit of {:.2} failed: {e}", draft.amount);
                    report.failed += 1;
                }
            }
        }

        self.synthesized.clear();
        log::debug!("drafts: commit_all {report:?}");
        report
    }

    /// Clear pending drafts, transcript and error.
    pub fn dismiss(&mut self) {
        self.pending.clear();
        self.synthesized.clear();
        self.transcript.clear();
        self.error = None;
    }

    fn persist_synthesized(
        &mut self,
        category_id: CategoryId,
        categories: &dyn CategoryStore,
    ) -> Result<(), ReconcileError> {
        if let Some(category) = self.synthesized.get(&category_id) {
            categories.insert(category)?;
            log::info!("drafts: persisted new category {:?}", category.name);
            self.synthesized.remove(&category_id);
        }
        Ok(())
    }
}

/// Remove the first entry structurally equal to `draft`.  Returns whether
/// anything was removed.
fn remove_first_match(pending: &mut Vec<Draft>, draft: &Draft) -> bool {
    match pending.iter().position(|p| p.same_identity(draft)) {
        Some(index) => {
            pending.remove(index);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryCategoryStore, MemoryLedger, NewTransaction, StoreError};
    use crate::suggest::TransactionType;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 6, 9, 30, 0).unwrap()
    }

    fn food() -> Category {
        Category::new("Food", "🍜", "#DD6B20")
    }

    fn expense(amount: f64, category: &str) -> Suggestion {
        Suggestion::new()
            .with_amount(amount)
            .with_kind(TransactionType::Expense)
            .with_category_name(category)
    }

    struct RejectingLedger;

    impl LedgerStore for RejectingLedger {
        fn create(&self, _transaction: &NewTransaction) -> Result<(), StoreError> {
            Err(StoreError::Backend("disk full".into()))
        }
    }

    /// Rejects only transactions of the given amount.
    struct PickyLedger {
        reject: f64,
        inner: MemoryLedger,
    }

    impl LedgerStore for PickyLedger {
        fn create(&self, transaction: &NewTransaction) -> Result<(), StoreError> {
            if transaction.amount == self.reject {
                return Err(StoreError::Backend("rejected".into()));
            }
            self.inner.create(transaction)
        }
    }

    #[test]
    fn ingest_resolves_and_preserves_order() {
        let food = food();
        let mut taxonomy = TaxonomyRegistry::from_categories(vec![food.clone()]);
        let mut reconciler = DraftReconciler::default();

        let drafts = reconciler.ingest(
            &[expense(35.0, "Food"), expense(68.0, "food")],
            &mut taxonomy,
            now(),
        );

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].amount, 35.0);
        assert_eq!(drafts[1].amount, 68.0);
        assert!(drafts.iter().all(|d| d.category_id == Some(food.id)));
        assert!(reconciler.unpersisted_categories().is_empty());
    }

    #[test]
    fn ingest_drops_structural_duplicates() {
        let mut taxonomy = TaxonomyRegistry::from_categories(vec![food()]);
        let mut reconciler = DraftReconciler::default();
        let drafts = reconciler.ingest(
            &[
                expense(35.0, "Food").with_short_description("Coffee"),
                expense(35.0, "Food").with_short_description("Latte"),
                expense(36.0, "Food"),
            ],
            &mut taxonomy,
            now(),
        );
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].short_description, "Coffee");
    }

    #[test]
    fn ingest_supersedes_previous_batch() {
        let mut taxonomy = TaxonomyRegistry::from_categories(vec![food()]);
        let mut reconciler = DraftReconciler::default();
        reconciler.ingest(&[expense(1.0, "Food"), expense(2.0, "Food")], &mut taxonomy, now());
        reconciler.ingest(&[expense(3.0, "Food")], &mut taxonomy, now());

        let amounts: Vec<_> = reconciler.pending().iter().map(|d| d.amount).collect();
        assert_eq!(amounts, vec![3.0]);
    }

    #[test]
    fn same_unknown_name_synthesizes_once_per_batch() {
        let mut taxonomy = TaxonomyRegistry::from_categories(vec![food()]);
        let mut reconciler = DraftReconciler::default();
        let drafts = reconciler.ingest(
            &[expense(10.0, "Travel"), expense(20.0, "TRAVEL")],
            &mut taxonomy,
            now(),
        );

        assert_eq!(drafts[0].category_id, drafts[1].category_id);
        assert_eq!(taxonomy.len(), 2);
        assert_eq!(reconciler.unpersisted_categories().len(), 1);
        assert_eq!(reconciler.unpersisted_categories()[0].name, "Travel");
    }

    #[test]
    fn empty_taxonomy_leaves_draft_unresolved() {
        let mut taxonomy = TaxonomyRegistry::new();
        let mut reconciler = DraftReconciler::default();
        let drafts = reconciler.ingest(&[Suggestion::new().with_amount(-5.0)], &mut taxonomy, now());
        assert_eq!(drafts[0].amount, 0.0);
        assert_eq!(drafts[0].category_id, None);
    }

    #[test]
    fn commit_one_writes_and_removes() {
        let mut taxonomy = TaxonomyRegistry::from_categories(vec![food()]);
        let mut reconciler = DraftReconciler::default();
        reconciler.ingest(&[expense(35.0, "Food"), expense(68.0, "Food")], &mut taxonomy, now());
        let (categories, ledger) = (MemoryCategoryStore::new(), MemoryLedger::new());

        let first = reconciler.pending()[0].clone();
        let outcome = reconciler.commit_one(&first, &categories, &ledger).unwrap();
        assert_eq!(outcome, CommitOutcome::Pending(1));
        assert_eq!(ledger.entries().len(), 1);
        assert_eq!(ledger.entries()[0].amount, 35.0);

        let outcome = reconciler.commit_at(0, &categories, &ledger).unwrap();
        assert_eq!(outcome, CommitOutcome::Completed);
        assert!(reconciler.is_empty());
    }

    #[test]
    fn commit_one_uses_edited_fields_of_the_passed_draft() {
        let mut taxonomy = TaxonomyRegistry::from_categories(vec![food()]);
        let mut reconciler = DraftReconciler::default();
        reconciler.ingest(&[expense(35.0, "Food")], &mut taxonomy, now());
        let (categories, ledger) = (MemoryCategoryStore::new(), MemoryLedger::new());

        let mut draft = reconciler.pending()[0].clone();
        draft.merchant = " Pacific Coffee ".into();
        reconciler.commit_one(&draft, &categories, &ledger).unwrap();
        assert_eq!(ledger.entries()[0].merchant, "Pacific Coffee");
    }

    #[test]
    fn remove_first_match_removes_exactly_one() {
        let id = Some(Uuid::new_v4());
        let draft = Draft::from_suggestion(&Suggestion::new().with_amount(5.0), id, now());
        let other = Draft::from_suggestion(&Suggestion::new().with_amount(6.0), id, now());
        let mut pending = vec![other.clone(), draft.clone(), draft.clone()];

        assert!(remove_first_match(&mut pending, &draft));
        assert_eq!(pending, vec![other.clone(), draft.clone()]);
        assert!(remove_first_match(&mut pending, &draft));
        assert!(!remove_first_match(&mut pending, &draft));
        assert_eq!(pending, vec![other]);
    }

    #[test]
    fn unresolved_draft_cannot_be_committed() {
        let mut taxonomy = TaxonomyRegistry::new();
        let mut reconciler = DraftReconciler::default();
        reconciler.ingest(&[Suggestion::new().with_amount(5.0)], &mut taxonomy, now());
        let (categories, ledger) = (MemoryCategoryStore::new(), MemoryLedger::new());

        let err = reconciler.commit_at(0, &categories, &ledger).unwrap_err();
        assert!(matches!(err, ReconcileError::Unresolved));
        assert_eq!(reconciler.pending().len(), 1);
        assert!(ledger.entries().is_empty());
    }

    #[test]
    fn zero_amount_draft_cannot_be_committed_alone() {
        let mut taxonomy = TaxonomyRegistry::from_categories(vec![food()]);
        let mut reconciler = DraftReconciler::default();
        reconciler.ingest(
            &[Suggestion::new().with_category_name("Travel")],
            &mut taxonomy,
            now(),
        );
        let (categories, ledger) = (MemoryCategoryStore::new(), MemoryLedger::new());

        let err = reconciler.commit_at(0, &categories, &ledger).unwrap_err();
        assert!(matches!(err, ReconcileError::ZeroAmount));
        assert_eq!(reconciler.pending().len(), 1);
        assert!(ledger.entries().is_empty());
        assert!(categories.list_all().unwrap().is_empty());

        let mut fixed = reconciler.pending()[0].clone();
        fixed.amount = 42.0;
        reconciler.edit(0, fixed).unwrap();
        assert_eq!(
            reconciler.commit_at(0, &categories, &ledger).unwrap(),
            CommitOutcome::Completed
        );
        assert_eq!(ledger.entries()[0].amount, 42.0);
    }

    #[test]
    fn committing_a_foreign_draft_is_rejected() {
        let mut reconciler = DraftReconciler::default();
        let (categories, ledger) = (MemoryCategoryStore::new(), MemoryLedger::new());
        let stray = Draft::from_suggestion(&Suggestion::new(), Some(Uuid::new_v4()), now());
        assert!(matches!(
            reconciler.commit_one(&stray, &categories, &ledger),
            Err(ReconcileError::NotPending)
        ));
        assert!(matches!(
            reconciler.commit_at(3, &categories, &ledger),
            Err(ReconcileError::NotPending)
        ));
    }

    #[test]
    fn ledger_failure_keeps_draft_pending() {
        let mut taxonomy = TaxonomyRegistry::from_categories(vec![food()]);
        let mut reconciler = DraftReconciler::default();
        reconciler.ingest(&[expense(35.0, "Food")], &mut taxonomy, now());

        let err = reconciler
            .commit_at(0, &MemoryCategoryStore::new(), &RejectingLedger)
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Store(_)));
        assert_eq!(reconciler.pending().len(), 1);
    }

    #[test]
    fn synthesized_category_persisted_with_first_referencing_commit() {
        let mut taxonomy = TaxonomyRegistry::from_categories(vec![food()]);
        let mut reconciler = DraftReconciler::default();
        reconciler.ingest(
            &[expense(10.0, "Food"), expense(20.0, "Travel"), expense(30.0, "Travel")],
            &mut taxonomy,
            now(),
        );
        let (categories, ledger) = (MemoryCategoryStore::new(), MemoryLedger::new());

        reconciler.commit_at(0, &categories, &ledger).unwrap();
        assert!(categories.list_all().unwrap().is_empty());

        reconciler.commit_at(0, &categories, &ledger).unwrap();
        let stored = categories.list_all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Travel");
        assert!(reconciler.unpersisted_categories().is_empty());

        reconciler.commit_at(0, &categories, &ledger).unwrap();
        assert_eq!(categories.list_all().unwrap().len(), 1);
        assert_eq!(ledger.entries().len(), 3);
    }

    #[test]
    fn dismiss_discards_synthesized_categories() {
        let mut taxonomy = TaxonomyRegistry::new();
        let mut reconciler = DraftReconciler::default();
        reconciler.set_transcript("Flight 900");
        reconciler.ingest(&[expense(900.0, "Travel")], &mut taxonomy, now());
        reconciler.set_error("stale");

        reconciler.dismiss();
        assert!(reconciler.is_empty());
        assert!(reconciler.unpersisted_categories().is_empty());
        assert_eq!(reconciler.transcript(), "");
        assert_eq!(reconciler.error(), None);
    }

    #[test]
    fn commit_all_skips_unresolved_and_clears() {
        let food = food();
        let mut taxonomy = TaxonomyRegistry::from_categories(vec![food.clone()]);
        let mut reconciler = DraftReconciler::default();
        reconciler.ingest(&[expense(35.0, "Food"), expense(68.0, "Food")], &mut taxonomy, now());
        let mut unresolved = reconciler.pending()[1].clone();
        unresolved.category_id = None;
        reconciler.edit(1, unresolved).unwrap();

        let ledger = MemoryLedger::new();
        let report = reconciler.commit_all(&MemoryCategoryStore::new(), &ledger);

        assert_eq!(report, CommitReport { committed: 1, skipped: 1, failed: 0 });
        assert_eq!(ledger.entries().len(), 1);
        assert!(reconciler.is_empty());
    }

    #[test]
    fn commit_all_continues_past_store_failure() {
        let mut taxonomy = TaxonomyRegistry::from_categories(vec![food()]);
        let mut reconciler = DraftReconciler::default();
        reconciler.ingest(
            &[expense(1.0, "Food"), expense(2.0, "Food"), expense(3.0, "Food")],
            &mut taxonomy,
            now(),
        );
        let ledger = PickyLedger { reject: 2.0, inner: MemoryLedger::new() };

        let report = reconciler.commit_all(&MemoryCategoryStore::new(), &ledger);
        assert_eq!(report, CommitReport { committed: 2, skipped: 0, failed: 1 });
        let amounts: Vec<_> = ledger.inner.entries().iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![1.0, 3.0]);
        assert!(reconciler.is_empty());
    }

    #[test]
    fn edit_rejects_collisions() {
        let mut taxonomy = TaxonomyRegistry::from_categories(vec![food()]);
        let mut reconciler = DraftReconciler::default();
        reconciler.ingest(&[expense(35.0, "Food"), expense(68.0, "Food")], &mut taxonomy, now());

        let mut edited = reconciler.pending()[1].clone();
        edited.amount = 35.0;
        assert!(matches!(reconciler.edit(1, edited), Err(ReconcileError::DuplicateDraft)));

        let mut edited = reconciler.pending()[1].clone();
        edited.short_description = "Lunch".into();
        reconciler.edit(1, edited).unwrap();
        assert_eq!(reconciler.pending()[1].short_description, "Lunch");

        let first = reconciler.pending()[0].clone();
        assert!(matches!(reconciler.edit(9, first), Err(ReconcileError::NotPending)));
    }

    #[test]
    fn new_transcript_clears_pending_and_error() {
        let mut taxonomy = TaxonomyRegistry::from_categories(vec![food()]);
        let mut reconciler = DraftReconciler::default();
        reconciler.ingest(&[expense(35.0, "Food")], &mut taxonomy, now());
        reconciler.set_error("boom");

        reconciler.on_new_transcript("Taxi 80");
        assert!(reconciler.is_empty());
        assert_eq!(reconciler.error(), None);
        assert_eq!(reconciler.transcript(), "Taxi 80");
    }
}
