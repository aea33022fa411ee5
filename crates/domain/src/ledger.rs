use chrono::NaiveDate;
use pennywise_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest accepted amount in minor currency units.
pub const MAX_ENTRY_AMOUNT: i64 = 10_000_000_000;

/// Longest accepted category label.
pub const MAX_CATEGORY_LENGTH: usize = 50;

/// Longest accepted free-text note.
pub const MAX_NOTE_LENGTH: usize = 200;

/// Direction of money flow for a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Money spent.
    Expense,
    /// Money received.
    Income,
}

/// A single expense or income line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    id: Uuid,
    kind: EntryKind,
    amount: i64,
    category: NonEmptyString,
    date: NaiveDate,
    note: Option<String>,
}

impl LedgerEntry {
    /// Creates a validated entry with a fresh identifier.
    pub fn new(
        kind: EntryKind,
        amount: i64,
        category: impl Into<String>,
        date: NaiveDate,
        note: Option<String>,
    ) -> AppResult<Self> {
        if amount <= 0 || amount > MAX_ENTRY_AMOUNT {
            return Err(AppError::Validation(format!(
                "amount must be between 1 and {MAX_ENTRY_AMOUNT}"
            )));
        }

        let category = NonEmptyString::new(category.into().trim())?;
        if category.as_str().chars().count() > MAX_CATEGORY_LENGTH {
            return Err(AppError::Validation(format!(
                "category must be at most {MAX_CATEGORY_LENGTH} characters"
            )));
        }

        let note = note
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        if note
            .as_deref()
            .is_some_and(|value| value.chars().count() > MAX_NOTE_LENGTH)
        {
            return Err(AppError::Validation(format!(
                "note must be at most {MAX_NOTE_LENGTH} characters"
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            category,
            date,
            note,
        })
    }

    /// Returns the entry identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns whether this entry is an expense or an income.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Returns the amount in minor currency units.
    #[must_use]
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Returns the category label.
    #[must_use]
    pub fn category(&self) -> &str {
        self.category.as_str()
    }

    /// Returns the booking date.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the optional note.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}
