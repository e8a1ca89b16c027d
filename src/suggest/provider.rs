//! The `SuggestionProvider` capability boundary and its error type.

use async_trait::async_trait;
use thiserror::Error;

use super::types::Suggestion;

// ---------------------------------------------------------------------------
// SuggestError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SuggestError {
    /// No interpretation capability on this runtime or build.
    #[error("text interpretation isn't available; enable it in settings")]
    Unavailable,

    /// Interpretation ran but produced nothing usable.
    #[error("no transactions were detected")]
    EmptyResult,

    /// The capability failed; carries the underlying message.
    #[error("text interpretation failed: {0}")]
    Provider(String),
}

impl From<reqwest::Error> for SuggestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SuggestError::Provider("request timed out".into())
        } else if e.is_connect() {
            SuggestError::Provider(format!("cannot reach the interpreter: {e}"))
        } else {
            SuggestError::Provider(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SuggestionProvider
// ---------------------------------------------------------------------------

/// Text → structured suggestions.
///
/// `known_categories` are the taxonomy names the interpreter should choose
/// from.  Implementations must be `Send + Sync` so they can be shared as
/// `Arc<dyn SuggestionProvider>`.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Interpret `text` as a single transaction.
    async fn suggest_one(
        &self,
        text: &str,
        known_categories: &[String],
    ) -> Result<Suggestion, SuggestError>;

    /// Interpret possibly multi-entry `text`, preserving input order.
    ///
    /// A provider that cannot segment reliably returns one suggestion for
    /// the whole text.
    async fn suggest_batch(
        &self,
        text: &str,
        known_categories: &[String],
    ) -> Result<Vec<Suggestion>, SuggestError>;
}
