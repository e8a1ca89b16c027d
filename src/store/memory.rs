//! In-process stores.

use std::sync::Mutex;

use super::{CategoryStore, LedgerStore, NewTransaction, StoreError};
use crate::taxonomy::Category;

fn poisoned(what: &str) -> StoreError {
    StoreError::Backend(format!("{what} lock poisoned"))
}

// ---------------------------------------------------------------------------
// MemoryCategoryStore
// ---------------------------------------------------------------------------

/// Category store backed by a `Vec`.  Listing is sorted by name,
/// case-insensitively, like a store fetch ordered by name.
#[derive(Debug, Default)]
pub struct MemoryCategoryStore {
    categories: Mutex<Vec<Category>>,
}

impl MemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            categories: Mutex::new(categories.into_iter().collect()),
        }
    }
}

impl CategoryStore for MemoryCategoryStore {
    fn list_all(&self) -> Result<Vec<Category>, StoreError> {
        let categories = self.categories.lock().map_err(|_| poisoned("category"))?;
        let mut listing = categories.clone();
        listing.sort_by_key(|c| c.name.to_lowercase());
        Ok(listing)
    }

    fn insert(&self, category: &Category) -> Result<(), StoreError> {
        let mut categories = self.categories.lock().map_err(|_| poisoned("category"))?;
        match categories.iter_mut().find(|c| c.id == category.id) {
            Some(existing) => *existing = category.clone(),
            None => categories.push(category.clone()),
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryLedger
// ---------------------------------------------------------------------------

/// Append-only ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Mutex<Vec<NewTransaction>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Created transactions in creation order.
    pub fn entries(&self) -> Vec<NewTransaction> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl LedgerStore for MemoryLedger {
    fn create(&self, transaction: &NewTransaction) -> Result<(), StoreError> {
        self.entries
            .lock()
            .map_err(|_| poisoned("ledger"))?
            .push(transaction.clone());
        Ok(())
    }
}
