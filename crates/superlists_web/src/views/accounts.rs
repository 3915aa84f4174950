//! Passwordless login endpoints.

use crate::error::WebResult;
use crate::session::{cleared_session_cookie, session_cookie, CurrentUser};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use log::warn;
use minijinja::context;
use serde::Deserialize;
use superlists_core::{AccountService, AccountServiceError, LoginEmail, SqliteAccountRepository};

pub const LOGIN_EMAIL_SENT_MESSAGE: &str =
    "Check your email, we've sent you a link you can use to log in.";
pub const INVALID_LOGIN_EMAIL_MESSAGE: &str = "Enter a valid email address to log in";

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub token: String,
}

/// Issues a login token and mails its link.
pub async fn send_login_email(
    user: CurrentUser,
    State(state): State<AppState>,
    Form(form): Form<LoginRequest>,
) -> WebResult<Html<String>> {
    let issued = state
        .with_db(move |conn| {
            let service = AccountService::new(SqliteAccountRepository::try_new(conn)?);
            match service.issue_login_token(&form.email) {
                Ok(token) => Ok(Some(token)),
                Err(AccountServiceError::InvalidEmail(_)) => Ok(None),
                Err(other) => Err(other.into()),
            }
        })
        .await?;

    let message = match issued {
        Some(token) => {
            state
                .mailer()
                .send(&LoginEmail::for_token(&token, state.base_url()))?;
            LOGIN_EMAIL_SENT_MESSAGE
        }
        None => {
            warn!("event=login_email module=web status=error error_code=invalid_email");
            INVALID_LOGIN_EMAIL_MESSAGE
        }
    };

    state.templates().render(
        "home.html",
        context! { user => user.email(), message => message },
    )
}

/// Redeems a login link; a valid token starts a session.
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> WebResult<Response> {
    let logged_in = state
        .with_db(move |conn| {
            let mut service = AccountService::new(SqliteAccountRepository::try_new(conn)?);
            Ok(service.login(&query.token)?)
        })
        .await?;

    match logged_in {
        Some((_, session_key)) => Ok((
            [(SET_COOKIE, session_cookie(&session_key))],
            Redirect::to("/"),
        )
            .into_response()),
        None => Ok(Redirect::to("/").into_response()),
    }
}

/// Ends the current session, if any, and clears the cookie.
pub async fn logout(user: CurrentUser, State(state): State<AppState>) -> WebResult<Response> {
    if let Some(session_key) = user.session_key {
        state
            .with_db(move |conn| {
                let service = AccountService::new(SqliteAccountRepository::try_new(conn)?);
                Ok(service.end_session(&session_key)?)
            })
            .await?;
    }

    Ok((
        [(SET_COOKIE, cleared_session_cookie())],
        Redirect::to("/"),
    )
        .into_response())
}
