//! Instructions, prompt text and output schemas for transaction extraction.
//!
//! [`PromptBuilder`] produces the `(instructions, prompt)` pair handed to a
//! [`GenerativeTextInterpreter`](super::GenerativeTextInterpreter):
//!
//! * instructions name the currency, the known categories and today's date
//!   so the model can resolve relative dates like "yesterday";
//! * the batch variant additionally asks for one entry per transaction in
//!   input order;
//! * the prompt itself is `Input: <text>`.

use chrono::{Local, NaiveDate};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Instruction templates
// ---------------------------------------------------------------------------

const SINGLE_INSTRUCTION: &str = "\
You extract structured expense data. Use {currency} amounts. \
Return expense or income. Choose a category from: {categories}.
Today is {today}. Use this to resolve relative dates.";

const BATCH_INSTRUCTION: &str = "\
You extract structured expense data. Use {currency} amounts.
If the input contains multiple transactions, return each one separately, \
in the same order as the input.
Return expense or income. Choose a category from: {categories}.
Today is {today}. Use this to resolve relative dates.";

// ---------------------------------------------------------------------------
// OutputSchema
// ---------------------------------------------------------------------------

/// Named JSON schema the interpreter's output must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: &'static str,
    pub schema: Value,
}

impl OutputSchema {
    /// One transaction: every field optional.
    pub fn entry() -> Self {
        Self {
            name: "expense_parsing_result",
            schema: entry_schema(),
        }
    }

    /// `{ "entries": [entry, ...] }`, in input order.
    pub fn batch() -> Self {
        Self {
            name: "multi_expense_parsing_result",
            schema: json!({
                "type": "object",
                "properties": {
                    "entries": {
                        "type": "array",
                        "description": "A list of extracted transactions. Keep the same order as the input.",
                        "items": entry_schema()
                    }
                },
                "required": ["entries"]
            }),
        }
    }
}

fn entry_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "amount": {
                "type": ["number", "null"],
                "description": "Amount as a number, without currency symbols."
            },
            "type": {
                "type": ["string", "null"],
                "description": "Either \"expense\" or \"income\"."
            },
            "category": {
                "type": ["string", "null"],
                "description": "One of the provided categories. Leave empty if unsure."
            },
            "shortDescription": {
                "type": ["string", "null"],
                "description": "Short description of the transaction, max 6 words."
            },
            "merchant": {
                "type": ["string", "null"],
                "description": "Merchant name if mentioned."
            },
            "date": {
                "type": ["string", "null"],
                "description": "Transaction date in YYYY-MM-DD. Resolve relative dates like yesterday."
            }
        }
    })
}

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds extraction instructions for a fixed currency and day.
///
/// # Example
/// ```rust
/// use chrono::NaiveDate;
/// use voice_ledger::suggest::PromptBuilder;
///
/// let today = NaiveDate::from_ymd_opt(2026, 2, 6).unwrap();
/// let builder = PromptBuilder::new("HKD", today);
/// let instructions = builder.single_instructions(&["Food".into(), "Transport".into()]);
/// assert!(instructions.contains("Food, Transport"));
/// assert!(instructions.contains("2026-02-06"));
/// ```
pub struct PromptBuilder {
    currency_code: String,
    today: NaiveDate,
}

impl PromptBuilder {
    pub fn new(currency_code: &str, today: NaiveDate) -> Self {
        Self {
            currency_code: currency_code.to_string(),
            today,
        }
    }

    /// Builder dated with the local calendar day.
    pub fn for_today(currency_code: &str) -> Self {
        Self::new(currency_code, Local::now().date_naive())
    }

    pub fn single_instructions(&self, known_categories: &[String]) -> String {
        self.fill(SINGLE_INSTRUCTION, known_categories)
    }

    pub fn batch_instructions(&self, known_categories: &[String]) -> String {
        self.fill(BATCH_INSTRUCTION, known_categories)
    }

    pub fn prompt(&self, text: &str) -> String {
        format!("Input: {}", text.trim())
    }

    fn fill(&self, template: &str, known_categories: &[String]) -> String {
        template
            .replace("{currency}", &self.currency_code)
            .replace("{categories}", &known_categories.join(", "))
            .replace("{today}", &self.today.format("%Y-%m-%d").to_string())
    }
}
