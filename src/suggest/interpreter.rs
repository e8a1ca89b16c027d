//! Generative text interpretation: the capability trait, its HTTP backend and
//! the [`SuggestionProvider`] built on top of it.
//!
//! ```text
//! InterpreterProvider ──PromptBuilder──▶ GenerativeTextInterpreter::interpret
//!         ▲                                       │ JSON per OutputSchema
//!         └──────── ParsedEntry → Suggestion ◀────┘
//! ```
//!
//! `ApiInterpreter` calls any OpenAI-compatible `/v1/chat/completions`
//! endpoint (Ollama, OpenAI, Groq, LM Studio, ...) and asks for a JSON
//! schema response.  When disabled in config it reports
//! [`SuggestError::Unavailable`]; an unreachable endpoint is a
//! [`SuggestError::Provider`] failure.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::InterpreterConfig;

use super::prompt::{OutputSchema, PromptBuilder};
use super::provider::{SuggestError, SuggestionProvider};
use super::types::{parse_suggested_date, Suggestion, TransactionType};

// ---------------------------------------------------------------------------
// GenerativeTextInterpreter trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait GenerativeTextInterpreter: Send + Sync {
    /// Run `prompt` under `instructions` and return JSON shaped by `schema`.
    async fn interpret(
        &self,
        instructions: &str,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<Value, SuggestError>;
}

// ---------------------------------------------------------------------------
// ApiInterpreter
// ---------------------------------------------------------------------------

pub struct ApiInterpreter {
    client: reqwest::Client,
    config: InterpreterConfig,
}

impl ApiInterpreter {
    /// Build from config; the HTTP client carries the per-request timeout.
    pub fn from_config(config: &InterpreterConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

#[async_trait]
impl GenerativeTextInterpreter for ApiInterpreter {
    async fn interpret(
        &self,
        instructions: &str,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<Value, SuggestError> {
        if !self.config.enabled {
            return Err(SuggestError::Unavailable);
        }

        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "system", "content": instructions },
                { "role": "user",   "content": prompt       }
            ],
            "stream":      false,
            "temperature": self.config.temperature,
            "response_format": {
                "type": "json_schema",
                "json_schema": { "name": schema.name, "schema": schema.schema }
            }
        });

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SuggestError::Provider(format!("HTTP {status}")));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| SuggestError::Provider(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .unwrap_or("");

        if content.is_empty() {
            return Err(SuggestError::EmptyResult);
        }

        parse_json_content(content)
    }
}

/// Parse model output as JSON, tolerating a surrounding Markdown fence.
fn parse_json_content(content: &str) -> Result<Value, SuggestError> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(unfenced.trim())
        .map_err(|e| SuggestError::Provider(format!("malformed interpreter output: {e}")))
}

// ---------------------------------------------------------------------------
// Parsed output
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedEntry {
    amount: Option<f64>,
    #[serde(rename = "type")]
    kind: Option<String>,
    category: Option<String>,
    short_description: Option<String>,
    merchant: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ParsedBatch {
    #[serde(default)]
    entries: Vec<ParsedEntry>,
}

impl ParsedEntry {
    fn into_suggestion(self) -> Suggestion {
        Suggestion {
            amount: self.amount.map(|a| a.max(0.0)),
            kind: self.kind.as_deref().and_then(TransactionType::parse_loose),
            category_id: None,
            category_name: self.category,
            short_description: self.short_description,
            merchant: self.merchant,
            date: self.date.as_deref().and_then(parse_suggested_date),
        }
    }
}

// ---------------------------------------------------------------------------
// InterpreterProvider
// ---------------------------------------------------------------------------

/// [`SuggestionProvider`] backed by a [`GenerativeTextInterpreter`].
pub struct InterpreterProvider<I: GenerativeTextInterpreter> {
    interpreter: I,
    currency_code: String,
}

impl<I: GenerativeTextInterpreter> InterpreterProvider<I> {
    pub fn new(interpreter: I, currency_code: &str) -> Self {
        Self {
            interpreter,
            currency_code: currency_code.to_string(),
        }
    }
}

#[async_trait]
impl<I: GenerativeTextInterpreter> SuggestionProvider for InterpreterProvider<I> {
    async fn suggest_one(
        &self,
        text: &str,
        known_categories: &[String],
    ) -> Result<Suggestion, SuggestError> {
        let builder = PromptBuilder::for_today(&self.currency_code);
        let value = self
            .interpreter
            .interpret(
                &builder.single_instructions(known_categories),
                &builder.prompt(text),
                &OutputSchema::entry(),
            )
            .await?;

        let entry: ParsedEntry = serde_json::from_value(value)
            .map_err(|e| SuggestError::Provider(format!("unexpected entry shape: {e}")))?;
        Ok(entry.into_suggestion())
    }

    async fn suggest_batch(
        &self,
        text: &str,
        known_categories: &[String],
    ) -> Result<Vec<Suggestion>, SuggestError> {
        let builder = PromptBuilder::for_today(&self.currency_code);
        let value = self
            .interpreter
            .interpret(
                &builder.batch_instructions(known_categories),
                &builder.prompt(text),
                &OutputSchema::batch(),
            )
            .await?;

        let batch: ParsedBatch = serde_json::from_value(value)
            .map_err(|e| SuggestError::Provider(format!("unexpected batch shape: {e}")))?;
        Ok(batch
            .entries
            .into_iter()
            .map(ParsedEntry::into_suggestion)
            .collect())
    }
}
