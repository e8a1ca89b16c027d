//! Versioned, owned view of the known categories.
//!
//! [`TaxonomyRegistry`] keeps categories in snapshot order, an id index and a
//! lower-cased name index.  Each [`insert`](TaxonomyRegistry::insert) bumps
//! the version so callers can tell whether a resolution pass synthesized
//! anything.

use std::collections::HashMap;

use super::category::{name_key, Category, CategoryId};

#[derive(Debug, Clone, Default)]
pub struct TaxonomyRegistry {
    order: Vec<CategoryId>,
    by_id: HashMap<CategoryId, Category>,
    by_name: HashMap<String, CategoryId>,
    version: u64,
}

impl TaxonomyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a store listing, keeping its order.
    ///
    /// When two stored categories share a name, the first one owns the
    /// name index entry.  The version starts at 0.
    pub fn from_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut registry = Self::new();
        for category in categories {
            registry.insert(category);
        }
        registry.version = 0;
        registry
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &CategoryId) -> Option<&Category> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &CategoryId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Case-insensitive exact lookup.
    pub fn find_by_name(&self, name: &str) -> Option<&Category> {
        self.by_name
            .get(&name_key(name))
            .and_then(|id| self.by_id.get(id))
    }

    /// First category in snapshot order.
    pub fn first(&self) -> Option<&Category> {
        self.order.first().and_then(|id| self.by_id.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Category names in snapshot order, as handed to the interpreter.
    pub fn names(&self) -> Vec<String> {
        self.iter().map(|c| c.name.clone()).collect()
    }

    /// `"<emoji> <name>"` for `id`, if known.
    pub fn display_name(&self, id: &CategoryId) -> Option<String> {
        self.get(id).map(Category::display_name)
    }

    /// Append `category` and return its id.
    ///
    /// Re-inserting a known id replaces the stored record in place.
    pub fn insert(&mut self, category: Category) -> CategoryId {
        let id = category.id;
        let key = name_key(&category.name);

        if !self.by_id.contains_key(&id) {
            self.order.push(id);
        }
        self.by_name.entry(key).or_insert(id);
        self.by_id.insert(id, category);
        self.version += 1;
        id
    }
}
