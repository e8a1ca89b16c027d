//! Deterministic [`SuggestionProvider`] for tests and offline runs.
//!
//! Answers come from a fixed script keyed by the exact text passed in, and
//! every call is recorded so tests can assert how many interpretations were
//! requested and in which order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::provider::{SuggestError, SuggestionProvider};
use super::types::Suggestion;

pub struct ScriptedProvider {
    batch: Result<Vec<Suggestion>, SuggestError>,
    singles: HashMap<String, Result<Suggestion, SuggestError>>,
    fallback_single: Result<Suggestion, SuggestError>,
    batch_calls: AtomicUsize,
    single_calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    /// Batch and single calls both report [`SuggestError::Unavailable`]
    /// until scripted otherwise.
    pub fn unavailable() -> Self {
        Self {
            batch: Err(SuggestError::Unavailable),
            singles: HashMap::new(),
            fallback_single: Err(SuggestError::Unavailable),
            batch_calls: AtomicUsize::new(0),
            single_calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every batch call with `suggestions`.
    pub fn with_batch(mut self, suggestions: Vec<Suggestion>) -> Self {
        self.batch = Ok(suggestions);
        self
    }

    pub fn with_batch_error(mut self, error: SuggestError) -> Self {
        self.batch = Err(error);
        self
    }

    /// Answer `suggest_one(text)` with `suggestion`.
    pub fn on_text(mut self, text: impl Into<String>, suggestion: Suggestion) -> Self {
        self.singles.insert(text.into(), Ok(suggestion));
        self
    }

    pub fn fail_text(mut self, text: impl Into<String>, error: SuggestError) -> Self {
        self.singles.insert(text.into(), Err(error));
        self
    }

    /// Answer for single calls whose text has no script entry.
    pub fn otherwise(mut self, suggestion: Suggestion) -> Self {
        self.fallback_single = Ok(suggestion);
        self
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Texts passed to `suggest_one`, in call order.
    pub fn single_calls(&self) -> Vec<String> {
        self.single_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.batch_calls() + self.single_calls().len()
    }
}

#[async_trait]
impl SuggestionProvider for ScriptedProvider {
    async fn suggest_one(
        &self,
        text: &str,
        _known_categories: &[String],
    ) -> Result<Suggestion, SuggestError> {
        if let Ok(mut calls) = self.single_calls.lock() {
            calls.push(text.to_string());
        }
        self.singles
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.fallback_single.clone())
    }

    async fn suggest_batch(
        &self,
        _text: &str,
        _known_categories: &[String],
    ) -> Result<Vec<Suggestion>, SuggestError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.batch.clone()
    }
}
