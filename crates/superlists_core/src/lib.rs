//! Core domain logic for Superlists.
//! Lists, items, sharing and passwordless accounts over SQLite.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::item::{
    Item, ItemId, ItemValidationError, DUPLICATE_ITEM_ERROR, EMPTY_ITEM_ERROR,
};
pub use model::list::{canonical_path, List, ListDetail, ListId, ListSummary};
pub use model::user::{normalize_email, User};
pub use repo::account_repo::{AccountRepository, LoginToken, SqliteAccountRepository};
pub use repo::list_repo::{ListRepository, RepoError, RepoResult, SqliteListRepository};
pub use service::account_service::{
    AccountService, AccountServiceError, LoginEmail, LOGIN_EMAIL_SUBJECT,
};
pub use service::item_form::{ItemForm, ItemFormError};
pub use service::list_service::{ListService, ListServiceError, INVALID_SHARE_ERROR};

