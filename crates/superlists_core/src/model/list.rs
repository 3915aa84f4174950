//! List record, read models and canonical location.
//!
//! # Invariants
//! - A list may exist with zero items.
//! - `shared_with` holds normalized emails, sorted and without duplicates.
//! - A list's display name is the text of its first item.

use crate::model::item::Item;
use serde::{Deserialize, Serialize};

/// Store-assigned list identifier.
pub type ListId = i64;

/// A to-do list with its optional owner and share set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    /// Owner email; `None` for lists created anonymously.
    pub owner: Option<String>,
    pub shared_with: Vec<String>,
}

/// List together with its items in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListDetail {
    pub list: List,
    pub items: Vec<Item>,
}

impl ListDetail {
    /// Display name: the first item's text, or empty for a list with no items.
    pub fn name(&self) -> &str {
        self.items.first().map_or("", |item| item.text.as_str())
    }
}

/// Row of the "my lists" page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    pub id: ListId,
    pub owner: Option<String>,
    /// First item text, or empty when the list has no items.
    pub name: String,
}

/// Stable URL path of a list, used as the redirect target after mutations.
pub fn canonical_path(list_id: ListId) -> String {
    format!("/lists/{list_id}/")
}
