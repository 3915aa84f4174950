//! Item submission form: the gatekeeper between raw text and the store.
//!
//! # Invariants
//! - Validation order is fixed: blank text first, then duplicate-in-list.
//! - A failed submission persists nothing and hands back the raw input.
//! - Duplicates detected by the store's unique constraint are reported
//!   exactly like duplicates caught by the pre-check.

use crate::model::item::{normalize_item_text, Item, ItemValidationError};
use crate::model::list::{List, ListId};
use crate::repo::list_repo::{ListRepository, RepoError};
use crate::service::list_service::ListServiceError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected submission, carrying the unsaved input for redisplay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFormError {
    pub error: ItemValidationError,
    /// Raw text exactly as submitted.
    pub input: String,
}

impl ItemFormError {
    /// User-facing message for the rejected submission.
    pub fn message(&self) -> &'static str {
        self.error.message()
    }
}

impl Display for ItemFormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for ItemFormError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

/// Raw item text submitted from the home page or a list page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemForm {
    raw: String,
}

impl ItemForm {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Applies the non-empty rule and returns the text to persist.
    pub fn clean(&self) -> Result<String, ItemFormError> {
        normalize_item_text(&self.raw).map_err(|error| self.reject(error))
    }

    /// Applies both rules against an existing list without writing anything.
    ///
    /// # Errors
    /// - `Invalid` for blank or duplicate text.
    /// - `ListNotFound` when `list_id` does not resolve.
    pub fn validate_for_list<R: ListRepository>(
        &self,
        repo: &R,
        list_id: ListId,
    ) -> Result<String, ListServiceError> {
        let text = self.clean()?;
        if repo.get_list(list_id)?.is_none() {
            return Err(ListServiceError::ListNotFound(list_id));
        }
        if repo.item_text_exists(list_id, &text)? {
            return Err(self.reject(ItemValidationError::DuplicateItem).into());
        }
        Ok(text)
    }

    /// Saves the first item of a brand-new list.
    ///
    /// List and item are created together or not at all.
    pub fn save_new_list<R: ListRepository>(
        &self,
        repo: &mut R,
        owner: Option<&str>,
    ) -> Result<(List, Item), ListServiceError> {
        let text = self.clean()?;
        repo.create_list_with_item(owner, &text)
            .map_err(|err| self.map_repo_error(err))
    }

    /// Appends the submitted text to an existing list.
    pub fn save_to_list<R: ListRepository>(
        &self,
        repo: &R,
        list_id: ListId,
    ) -> Result<Item, ListServiceError> {
        let text = self.validate_for_list(repo, list_id)?;
        repo.create_item(list_id, &text)
            .map_err(|err| self.map_repo_error(err))
    }

    fn reject(&self, error: ItemValidationError) -> ItemFormError {
        ItemFormError {
            error,
            input: self.raw.clone(),
        }
    }

    fn map_repo_error(&self, err: RepoError) -> ListServiceError {
        match err {
            RepoError::Validation(error) => ListServiceError::Invalid(self.reject(error)),
            other => other.into(),
        }
    }
}
