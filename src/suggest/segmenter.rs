//! Fallback segmentation for multi-entry text.
//!
//! When the provider cannot batch (it reports [`SuggestError::Unavailable`]
//! or returns an empty list), [`SegmentingProvider`] splits the text on
//! newlines and semicolons and interprets each segment on its own.
//!
//! Segments are processed **sequentially** in input order.  A failed segment
//! is logged and skipped; the batch is best-effort.  If every segment fails
//! the result is an empty list, which the pipeline reports as
//! [`SuggestError::EmptyResult`].

use async_trait::async_trait;

use super::provider::{SuggestError, SuggestionProvider};
use super::types::Suggestion;

// ---------------------------------------------------------------------------
// TextSegmenter
// ---------------------------------------------------------------------------

pub struct TextSegmenter;

impl TextSegmenter {
    /// Split on `'\n'` or `';'`, trim, drop empty pieces.
    ///
    /// ```
    /// use voice_ledger::suggest::TextSegmenter;
    ///
    /// assert_eq!(TextSegmenter::split("Coffee 35; Lunch 68"), vec!["Coffee 35", "Lunch 68"]);
    /// assert_eq!(TextSegmenter::split(" ;\n "), Vec::<&str>::new());
    /// ```
    pub fn split(text: &str) -> Vec<&str> {
        text.split(|c: char| c == '\n' || c == ';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Interpret `text` one segment at a time through `provider.suggest_one`.
    ///
    /// With one segment or fewer the whole text is interpreted once and its
    /// error, if any, is returned.
    pub async fn suggest_each<P>(
        provider: &P,
        text: &str,
        known_categories: &[String],
    ) -> Result<Vec<Suggestion>, SuggestError>
    where
        P: SuggestionProvider + ?Sized,
    {
        let segments = Self::split(text);
        if segments.len() <= 1 {
            let single = provider.suggest_one(text, known_categories).await?;
            return Ok(vec![single]);
        }

        let mut results = Vec::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            match provider.suggest_one(segment, known_categories).await {
                Ok(suggestion) => results.push(suggestion),
                Err(e) => {
                    log::warn!("segment {index} skipped: {e}");
                }
            }
        }
        Ok(results)
    }
}

// ---------------------------------------------------------------------------
// SegmentingProvider
// ---------------------------------------------------------------------------

/// Wraps a provider and falls back to [`TextSegmenter`] when batching is not
/// possible.
pub struct SegmentingProvider<P: SuggestionProvider> {
    inner: P,
}

impl<P: SuggestionProvider> SegmentingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: SuggestionProvider> SuggestionProvider for SegmentingProvider<P> {
    async fn suggest_one(
        &self,
        text: &str,
        known_categories: &[String],
    ) -> Result<Suggestion, SuggestError> {
        self.inner.suggest_one(text, known_categories).await
    }

    async fn suggest_batch(
        &self,
        text: &str,
        known_categories: &[String],
    ) -> Result<Vec<Suggestion>, SuggestError> {
        match self.inner.suggest_batch(text, known_categories).await {
            Ok(batch) if !batch.is_empty() => return Ok(batch),
            Ok(_) => log::debug!("batch interpretation returned nothing; segmenting"),
            Err(SuggestError::Unavailable) => {
                log::debug!("batch interpretation unavailable; segmenting")
            }
            Err(e) => return Err(e),
        }
        TextSegmenter::suggest_each(&self.inner, text, known_categories).await
    }
}
