//! Category taxonomy: records, the versioned registry and name resolution.
//!
//! ```text
//! CategoryStore::list_all ──▶ TaxonomyRegistry (working snapshot)
//!                                    │
//!        Suggestion ──▶ CategoryResolver::resolve ──▶ Resolution
//!                                    │
//!                      synthesized categories stay in the snapshot
//!                      until a commit persists them
//! ```

pub mod category;
pub mod registry;
pub mod resolver;

pub use category::{color_hex_for, Category, CategoryId, DEFAULT_EMOJI};
pub use registry::TaxonomyRegistry;
pub use resolver::{CategoryResolver, Resolution};
