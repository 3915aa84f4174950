//! Item record and item text validation rules.
//!
//! # Invariants
//! - Persisted `text` is trimmed and never empty.
//! - `text` is unique within its list; the same text may live in other lists.

use crate::model::list::ListId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned item identifier. Ascending ids follow creation order.
pub type ItemId = i64;

/// Message shown when an item submission is blank.
pub const EMPTY_ITEM_ERROR: &str = "You can't have an empty list item";
/// Message shown when an item submission repeats text already in the list.
pub const DUPLICATE_ITEM_ERROR: &str = "You've already got this in your list";

/// One entry of a to-do list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub list_id: ListId,
    pub text: String,
}

impl Display for Item {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Rule violated by a submitted item text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemValidationError {
    /// Text is empty or whitespace-only.
    EmptyText,
    /// Text already exists in the target list.
    DuplicateItem,
}

impl ItemValidationError {
    /// User-facing message for this violation.
    pub fn message(self) -> &'static str {
        match self {
            Self::EmptyText => EMPTY_ITEM_ERROR,
            Self::DuplicateItem => DUPLICATE_ITEM_ERROR,
        }
    }
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl Error for ItemValidationError {}

/// Trims `raw` and rejects blank input.
///
/// This is the single non-empty rule shared by the form layer and the store.
pub fn normalize_item_text(raw: &str) -> Result<String, ItemValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ItemValidationError::EmptyText);
    }
    Ok(trimmed.to_string())
}
