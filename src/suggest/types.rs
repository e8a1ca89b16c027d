//! Raw interpretation output: [`Suggestion`] and [`TransactionType`].

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::taxonomy::CategoryId;

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Expense,
    Income,
}

impl TransactionType {
    pub fn title(&self) -> &'static str {
        match self {
            TransactionType::Expense => "Expense",
            TransactionType::Income => "Income",
        }
    }

    /// Loose match on interpreter output.
    ///
    /// "income" is checked before "expense", so `"income/expense"` reads as
    /// income.  Anything else is `None`.
    ///
    /// ```
    /// use voice_ledger::suggest::TransactionType;
    ///
    /// assert_eq!(TransactionType::parse_loose("Income"), Some(TransactionType::Income));
    /// assert_eq!(TransactionType::parse_loose("an expense"), Some(TransactionType::Expense));
    /// assert_eq!(TransactionType::parse_loose("refund"), None);
    /// ```
    pub fn parse_loose(value: &str) -> Option<Self> {
        let value = value.to_lowercase();
        if value.contains("income") {
            Some(TransactionType::Income)
        } else if value.contains("expense") {
            Some(TransactionType::Expense)
        } else {
            None
        }
    }
}

/// Parse a `YYYY-MM-DD` date as local midnight.
pub fn parse_suggested_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let day = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let midnight = day.and_hms_opt(0, 0, 0)?;
    match Local.from_local_datetime(&midnight).earliest() {
        Some(local) => Some(local.with_timezone(&Utc)),
        None => Some(Utc.from_utc_datetime(&midnight)),
    }
}

// ---------------------------------------------------------------------------
// Suggestion
// ---------------------------------------------------------------------------

/// One uncertain extraction.  Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Suggestion {
    pub amount: Option<f64>,
    pub kind: Option<TransactionType>,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub short_description: Option<String>,
    pub merchant: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl Suggestion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_category_id(mut self, id: CategoryId) -> Self {
        self.category_id = Some(id);
        self
    }

    pub fn with_category_name(mut self, name: impl Into<String>) -> Self {
        self.category_name = Some(name.into());
        self
    }

    pub fn with_short_description(mut self, text: impl Into<String>) -> Self {
        self.short_description = Some(text.into());
        self
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant = Some(merchant.into());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }
}
