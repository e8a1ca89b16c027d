//! Contracts for the stores the pipeline writes to.
//!
//! Persistence itself lives outside this crate.  [`CategoryStore`] lists and
//! inserts categories, [`LedgerStore`] creates one transaction per committed
//! draft.  [`memory`] holds in-process implementations used by the binary's
//! text mode and by tests.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::suggest::TransactionType;
use crate::taxonomy::{Category, CategoryId};

pub use memory::{MemoryCategoryStore, MemoryLedger};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Store traits
// ---------------------------------------------------------------------------

/// Reads and extends the category taxonomy.
pub trait CategoryStore: Send + Sync {
    /// Every known category, in display order.
    fn list_all(&self) -> Result<Vec<Category>, StoreError>;

    /// Add a category.  Inserting an id that already exists replaces it.
    fn insert(&self, category: &Category) -> Result<(), StoreError>;
}

/// Creates ledger transactions.
pub trait LedgerStore: Send + Sync {
    fn create(&self, transaction: &NewTransaction) -> Result<(), StoreError>;
}

/// Fields handed to [`LedgerStore::create`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub category_id: CategoryId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub short_description: String,
    pub note: String,
    pub merchant: String,
}
