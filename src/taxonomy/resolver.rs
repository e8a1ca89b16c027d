//! Maps a suggestion's category hint onto a taxonomy id.
//!
//! Priority order:
//!
//! 1. explicit category id, trusted verbatim;
//! 2. case-insensitive exact name match;
//! 3. unmatched name → synthesize a category and append it to the working
//!    registry, so later suggestions in the same batch match it;
//! 4. no name at all → first category of the registry, or nothing.

use crate::suggest::Suggestion;

use super::category::{Category, CategoryId, DEFAULT_EMOJI};
use super::registry::TaxonomyRegistry;

/// How a category id was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Explicit(CategoryId),
    Matched(CategoryId),
    /// A new category was appended to the working registry.
    Synthesized(Category),
    Defaulted(CategoryId),
    /// Registry empty and no usable hint.
    Unresolved,
}

impl Resolution {
    pub fn category_id(&self) -> Option<CategoryId> {
        match self {
            Resolution::Explicit(id) | Resolution::Matched(id) | Resolution::Defaulted(id) => {
                Some(*id)
            }
            Resolution::Synthesized(category) => Some(category.id),
            Resolution::Unresolved => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryResolver {
    default_emoji: String,
}

impl CategoryResolver {
    pub fn new(default_emoji: impl Into<String>) -> Self {
        Self {
            default_emoji: default_emoji.into(),
        }
    }

    /// Resolve `suggestion` against `taxonomy`, synthesizing into it when the
    /// suggested name is unknown.
    ///
    /// Nothing is persisted here; synthesized categories live only in the
    /// registry passed in and in the returned [`Resolution`].
    pub fn resolve(&self, suggestion: &Suggestion, taxonomy: &mut TaxonomyRegistry) -> Resolution {
        if let Some(id) = suggestion.category_id {
            return Resolution::Explicit(id);
        }

        let name = suggestion
            .category_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        match name {
            Some(name) => {
                if let Some(existing) = taxonomy.find_by_name(name) {
                    return Resolution::Matched(existing.id);
                }
                let category = Category::synthesized(name, &self.default_emoji);
                log::debug!("taxonomy: synthesized category {:?}", category.name);
                taxonomy.insert(category.clone());
                Resolution::Synthesized(category)
            }
            None => match taxonomy.first() {
                Some(first) => Resolution::Defaulted(first.id),
                None => Resolution::Unresolved,
            },
        }
    }
}

impl Default for CategoryResolver {
    fn default() -> Self {
        Self::new(DEFAULT_EMOJI)
    }
}
