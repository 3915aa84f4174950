//! List use-case service: creation, items, sharing and visibility.
//!
//! # Responsibility
//! - Route item submissions through `ItemForm`.
//! - Normalize share targets before they reach the store.
//! - Assemble the read models rendered by list pages.
//!
//! # Invariants
//! - Owners and viewers are passed in explicitly, never read from ambient state.
//! - A list is visible to its owner and to every email in its share set.

use crate::model::item::Item;
use crate::model::list::{List, ListDetail, ListId, ListSummary};
use crate::model::user::normalize_email;
use crate::repo::list_repo::{ListRepository, RepoError, RepoResult};
use crate::service::item_form::{ItemForm, ItemFormError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Message shown when a share target is not a usable email address.
pub const INVALID_SHARE_ERROR: &str = "Enter a valid email address to share with";

/// Errors from list use-cases.
#[derive(Debug)]
pub enum ListServiceError {
    /// Item submission failed validation; nothing was saved.
    Invalid(ItemFormError),
    /// Target list does not exist.
    ListNotFound(ListId),
    /// Owner or viewer identity does not exist.
    UserNotFound(String),
    /// Share target is not a valid email address.
    InvalidShareTarget(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ListServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::UserNotFound(email) => write!(f, "user not found: {email}"),
            Self::InvalidShareTarget(_) => f.write_str(INVALID_SHARE_ERROR),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ListServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ListServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ListNotFound(id) => Self::ListNotFound(id),
            RepoError::UserNotFound(email) => Self::UserNotFound(email),
            other => Self::Repo(other),
        }
    }
}

impl From<ItemFormError> for ListServiceError {
    fn from(value: ItemFormError) -> Self {
        Self::Invalid(value)
    }
}

/// List service facade over a list repository.
pub struct ListService<R: ListRepository> {
    repo: R,
}

impl<R: ListRepository> ListService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an empty list with an optional owner.
    pub fn create_list(&self, owner: Option<&str>) -> Result<List, ListServiceError> {
        let list = self.repo.create_list(owner)?;
        info!(
            "event=list_create module=service status=ok list_id={} owned={}",
            list.id,
            list.owner.is_some()
        );
        Ok(list)
    }

    /// Creates a list from its first item submission.
    ///
    /// # Contract
    /// - `owner` is the authenticated identity, if any.
    /// - On validation failure neither list nor item is persisted.
    pub fn new_list(
        &mut self,
        owner: Option<&str>,
        raw_text: &str,
    ) -> Result<(List, Item), ListServiceError> {
        let form = ItemForm::new(raw_text);
        let (list, item) = form.save_new_list(&mut self.repo, owner)?;
        info!(
            "event=list_create module=service status=ok list_id={} item_id={} owned={}",
            list.id,
            item.id,
            list.owner.is_some()
        );
        Ok((list, item))
    }

    /// Appends one submitted item to an existing list.
    pub fn add_item(&self, list_id: ListId, raw_text: &str) -> Result<Item, ListServiceError> {
        let form = ItemForm::new(raw_text);
        let item = form.save_to_list(&self.repo, list_id)?;
        info!(
            "event=item_add module=service status=ok list_id={} item_id={}",
            list_id, item.id
        );
        Ok(item)
    }

    /// Items of one list in creation order.
    pub fn items_for_list(&self, list_id: ListId) -> RepoResult<Vec<Item>> {
        self.repo.items_for_list(list_id)
    }

    /// Loads a list with its items for display.
    pub fn list_detail(&self, list_id: ListId) -> Result<ListDetail, ListServiceError> {
        let list = self
            .repo
            .get_list(list_id)?
            .ok_or(ListServiceError::ListNotFound(list_id))?;
        let items = self.repo.items_for_list(list_id)?;
        Ok(ListDetail { list, items })
    }

    /// Shares a list with the identity named by `raw_email`.
    ///
    /// The email does not have to belong to a registered user yet.
    pub fn share_list(&self, list_id: ListId, raw_email: &str) -> Result<(), ListServiceError> {
        let email = normalize_email(raw_email)
            .ok_or_else(|| ListServiceError::InvalidShareTarget(raw_email.to_string()))?;
        self.repo.share(list_id, &email)?;
        info!(
            "event=list_share module=service status=ok list_id={}",
            list_id
        );
        Ok(())
    }

    /// Lists owned by or shared with `email`.
    ///
    /// Malformed emails cannot own or receive lists, so they see nothing.
    pub fn lists_visible_to(&self, email: &str) -> Result<Vec<ListSummary>, ListServiceError> {
        match normalize_email(email) {
            Some(email) => Ok(self.repo.lists_visible_to(&email)?),
            None => Ok(Vec::new()),
        }
    }
}
