//! Normalized, not-yet-persisted transaction proposals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::NewTransaction;
use crate::suggest::{Suggestion, TransactionType};
use crate::taxonomy::CategoryId;

use super::ReconcileError;

/// A transaction proposal awaiting review.
///
/// Two drafts are structurally equal when amount, date, category and type
/// match; description, note and merchant are ignored.  See
/// [`Draft::same_identity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub category_id: Option<CategoryId>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub short_description: String,
    pub note: String,
    pub merchant: String,
}

/// Hashable structural identity of a [`Draft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DraftIdentity {
    amount_bits: u64,
    date: DateTime<Utc>,
    category_id: Option<CategoryId>,
    kind: TransactionType,
}

impl Draft {
    /// Normalize `suggestion` with an already resolved category.
    ///
    /// Missing, negative or non-finite amounts become 0; a missing date
    /// becomes `now`; missing type is expense; text fields are trimmed.
    pub fn from_suggestion(
        suggestion: &Suggestion,
        category_id: Option<CategoryId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            amount: normalize_amount(suggestion.amount),
            date: suggestion.date.unwrap_or(now),
            category_id,
            kind: suggestion.kind.unwrap_or_default(),
            short_description: trimmed(suggestion.short_description.as_deref()),
            note: String::new(),
            merchant: trimmed(suggestion.merchant.as_deref()),
        }
    }

    pub fn identity(&self) -> DraftIdentity {
        DraftIdentity {
            amount_bits: normalize_amount(Some(self.amount)).to_bits(),
            date: self.date,
            category_id: self.category_id,
            kind: self.kind,
        }
    }

    pub fn same_identity(&self, other: &Draft) -> bool {
        self.identity() == other.identity()
    }

    /// A draft can be committed on its own once it has a category and a
    /// positive amount.
    pub fn is_committable(&self) -> bool {
        self.category_id.is_some() && normalize_amount(Some(self.amount)) > 0.0
    }

    /// Ledger fields for this draft, trimmed.
    pub fn to_transaction(&self) -> Result<NewTransaction, ReconcileError> {
        let category_id = self.category_id.ok_or(ReconcileError::Unresolved)?;
        Ok(NewTransaction {
            amount: normalize_amount(Some(self.amount)),
            date: self.date,
            category_id,
            kind: self.kind,
            short_description: self.short_description.trim().to_string(),
            note: self.note.trim().to_string(),
            merchant: self.merchant.trim().to_string(),
        })
    }
}

fn normalize_amount(amount: Option<f64>) -> f64 {
    match amount {
        // `-0.0 > 0.0` is false, so negative zero lands on 0.0 too.
        Some(a) if a.is_finite() && a > 0.0 => a,
        _ => 0.0,
    }
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}
