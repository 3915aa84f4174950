//! List pages: home, new list, list detail, item submission, sharing, my lists.
//!
//! # Responsibility
//! - Translate form posts into `ListService` calls with an explicit owner.
//! - Redirect after every successful mutation to the list's canonical path.
//! - Re-render the submitting page when validation fails.

use crate::error::{WebError, WebResult};
use crate::session::CurrentUser;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use minijinja::context;
use serde::Deserialize;
use superlists_core::{
    canonical_path, normalize_email, ItemFormError, ListDetail, ListId, ListService,
    ListServiceError, SqliteListRepository, INVALID_SHARE_ERROR,
};

#[derive(Debug, Default, Deserialize)]
pub struct ItemSubmission {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShareSubmission {
    #[serde(default)]
    pub share: String,
}

/// What went wrong on the list page, if anything.
enum ListFeedback {
    None,
    Item(ItemFormError),
    Share(String),
}

enum Submission<T> {
    Saved(T),
    Rejected(ListDetail, ListFeedback),
}

pub async fn home(user: CurrentUser, State(state): State<AppState>) -> WebResult<Html<String>> {
    state
        .templates()
        .render("home.html", context! { user => user.email() })
}

pub async fn new_list(
    user: CurrentUser,
    State(state): State<AppState>,
    Form(form): Form<ItemSubmission>,
) -> WebResult<Response> {
    let owner = user.email.clone();
    let outcome = state
        .with_db(move |conn| {
            let mut service = ListService::new(SqliteListRepository::try_new(conn)?);
            match service.new_list(owner.as_deref(), &form.text) {
                Ok((list, _)) => Ok(Ok(list.id)),
                Err(ListServiceError::Invalid(err)) => Ok(Err(err)),
                Err(other) => Err(other.into()),
            }
        })
        .await?;

    match outcome {
        Ok(list_id) => Ok(Redirect::to(&canonical_path(list_id)).into_response()),
        Err(err) => {
            let page = state.templates().render(
                "home.html",
                context! {
                    user => user.email(),
                    error => err.message(),
                    text => err.input,
                },
            )?;
            Ok(page.into_response())
        }
    }
}

pub async fn view_list(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> WebResult<Html<String>> {
    let list_id = parse_list_id(&raw_id)?;
    let detail = state
        .with_db(move |conn| {
            let service = ListService::new(SqliteListRepository::try_new(conn)?);
            Ok(service.list_detail(list_id)?)
        })
        .await?;
    render_list_page(&state, &user, &detail, ListFeedback::None)
}

pub async fn add_item(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Form(form): Form<ItemSubmission>,
) -> WebResult<Response> {
    let list_id = parse_list_id(&raw_id)?;
    let outcome = state
        .with_db(move |conn| {
            let service = ListService::new(SqliteListRepository::try_new(conn)?);
            match service.add_item(list_id, &form.text) {
                Ok(_) => Ok(Submission::Saved(())),
                Err(ListServiceError::Invalid(err)) => Ok(Submission::Rejected(
                    service.list_detail(list_id)?,
                    ListFeedback::Item(err),
                )),
                Err(other) => Err(other.into()),
            }
        })
        .await?;

    finish_list_submission(&state, &user, list_id, outcome)
}

pub async fn share_list(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Form(form): Form<ShareSubmission>,
) -> WebResult<Response> {
    let list_id = parse_list_id(&raw_id)?;
    let outcome = state
        .with_db(move |conn| {
            let service = ListService::new(SqliteListRepository::try_new(conn)?);
            match service.share_list(list_id, &form.share) {
                Ok(()) => Ok(Submission::Saved(())),
                Err(ListServiceError::InvalidShareTarget(input)) => Ok(Submission::Rejected(
                    service.list_detail(list_id)?,
                    ListFeedback::Share(input),
                )),
                Err(other) => Err(other.into()),
            }
        })
        .await?;

    finish_list_submission(&state, &user, list_id, outcome)
}

/// Lists owned by or shared with `email`. The address need not belong to a
/// registered user; a malformed one is a 404.
pub async fn my_lists(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> WebResult<Html<String>> {
    let owner =
        normalize_email(&email).ok_or_else(|| WebError::NotFound(format!("user `{email}`")))?;
    let lists = {
        let owner = owner.clone();
        state
            .with_db(move |conn| {
                let service = ListService::new(SqliteListRepository::try_new(conn)?);
                Ok(service.lists_visible_to(&owner)?)
            })
            .await?
    };

    let (owned, shared): (Vec<_>, Vec<_>) = lists
        .into_iter()
        .partition(|summary| summary.owner.as_deref() == Some(owner.as_str()));

    state.templates().render(
        "my_lists.html",
        context! {
            user => user.email(),
            owner => owner,
            owned => owned,
            shared => shared,
        },
    )
}

fn finish_list_submission(
    state: &AppState,
    user: &CurrentUser,
    list_id: ListId,
    outcome: Submission<()>,
) -> WebResult<Response> {
    match outcome {
        Submission::Saved(()) => Ok(Redirect::to(&canonical_path(list_id)).into_response()),
        Submission::Rejected(detail, feedback) => {
            Ok(render_list_page(state, user, &detail, feedback)?.into_response())
        }
    }
}

fn render_list_page(
    state: &AppState,
    user: &CurrentUser,
    detail: &ListDetail,
    feedback: ListFeedback,
) -> WebResult<Html<String>> {
    let (error, text, share_error, share_text) = match feedback {
        ListFeedback::None => (None, String::new(), None, String::new()),
        ListFeedback::Item(err) => (Some(err.message()), err.input, None, String::new()),
        ListFeedback::Share(input) => (None, String::new(), Some(INVALID_SHARE_ERROR), input),
    };

    state.templates().render(
        "list.html",
        context! {
            user => user.email(),
            list_id => detail.list.id,
            name => detail.name(),
            owner => &detail.list.owner,
            shared_with => &detail.list.shared_with,
            items => &detail.items,
            error => error,
            text => text,
            share_error => share_error,
            share_text => share_text,
        },
    )
}

/// Non-numeric ids cannot name a list.
fn parse_list_id(raw: &str) -> WebResult<ListId> {
    raw.parse::<ListId>()
        .map_err(|_| WebError::NotFound(format!("list `{raw}`")))
}
