//! Route table.

use crate::error::WebError;
use crate::middleware::log_requests;
use crate::state::AppState;
use crate::views::{accounts, lists};
use axum::routing::{get, post};
use axum::{middleware, Router};

/// Builds the application router over `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(lists::home))
        .route("/lists/new", post(lists::new_list))
        .route(
            "/lists/{list_id}/",
            get(lists::view_list).post(lists::add_item),
        )
        .route("/lists/{list_id}/share", post(lists::share_list))
        .route("/lists/users/{email}/", get(lists::my_lists))
        .route("/accounts/send_login_email", post(accounts::send_login_email))
        .route("/accounts/login", get(accounts::login))
        .route("/accounts/logout", get(accounts::logout))
        .route_layer(middleware::from_fn(log_requests))
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> WebError {
    WebError::NotFound("route".to_string())
}
