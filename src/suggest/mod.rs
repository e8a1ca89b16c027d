//! Text → transaction suggestions.
//!
//! This module provides:
//! * [`SuggestionProvider`]: async capability boundary (`suggest_one`,
//!   `suggest_batch`).
//! * [`InterpreterProvider`]: provider backed by a
//!   [`GenerativeTextInterpreter`]; [`ApiInterpreter`] is the HTTP backend.
//! * [`SegmentingProvider`] / [`TextSegmenter`]: per-segment fallback when
//!   batching is unavailable.
//! * [`ScriptedProvider`]: deterministic provider for tests.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voice_ledger::config::AppConfig;
//! use voice_ledger::suggest::{ApiInterpreter, InterpreterProvider, SegmentingProvider, SuggestionProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let provider = SegmentingProvider::new(InterpreterProvider::new(
//!         ApiInterpreter::from_config(&config.interpreter),
//!         &config.ledger.currency_code,
//!     ));
//!
//!     let known = vec!["Food".to_string(), "Transport".to_string()];
//!     let suggestions = provider.suggest_batch("Coffee 35; Taxi 80", &known).await.unwrap();
//!     println!("{suggestions:?}");
//! }
//! ```

pub mod interpreter;
pub mod prompt;
pub mod provider;
pub mod scripted;
pub mod segmenter;
pub mod types;

pub use interpreter::{ApiInterpreter, GenerativeTextInterpreter, InterpreterProvider};
pub use prompt::{OutputSchema, PromptBuilder};
pub use provider::{SuggestError, SuggestionProvider};
pub use scripted::ScriptedProvider;
pub use segmenter::{SegmentingProvider, TextSegmenter};
pub use types::{parse_suggested_date, Suggestion, TransactionType};
