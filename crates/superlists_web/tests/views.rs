use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use std::sync::Arc;
use superlists_core::db::open_db_in_memory;
use superlists_core::{
    AccountRepository, ListRepository, SqliteAccountRepository, SqliteListRepository,
    DUPLICATE_ITEM_ERROR, EMPTY_ITEM_ERROR, INVALID_SHARE_ERROR, LOGIN_EMAIL_SUBJECT,
};
use superlists_web::{app, AppState, OutboxMailer};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: AppState,
    mailer: Arc<OutboxMailer>,
}

impl TestApp {
    fn new() -> Self {
        let conn = open_db_in_memory().unwrap();
        let mailer = Arc::new(OutboxMailer::new());
        let state = AppState::new(conn, mailer.clone(), "http://testserver").unwrap();
        Self {
            router: app(state.clone()),
            state,
            mailer,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder =
            Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    async fn create_list(&self, texts: &'static [&'static str]) -> i64 {
        self.state
            .with_db(move |conn| {
                let repo = SqliteListRepository::try_new(conn)?;
                let list = repo.create_list(None)?;
                for text in texts {
                    repo.create_item(list.id, text)?;
                }
                Ok(list.id)
            })
            .await
            .unwrap()
    }

    async fn items(&self, list_id: i64) -> Vec<String> {
        self.state
            .with_db(move |conn| {
                let repo = SqliteListRepository::try_new(conn)?;
                Ok(repo
                    .items_for_list(list_id)?
                    .into_iter()
                    .map(|item| item.text)
                    .collect())
            })
            .await
            .unwrap()
    }

    async fn list_count(&self) -> i64 {
        self.state
            .with_db(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM lists;", [], |row| row.get(0))
                    .map_err(superlists_core::RepoError::from)?;
                Ok(count)
            })
            .await
            .unwrap()
    }

    /// Registers `email` and returns a `Cookie` header value for a fresh session.
    async fn login_cookie(&self, email: &'static str) -> String {
        let key = self
            .state
            .with_db(move |conn| {
                let repo = SqliteAccountRepository::try_new(conn)?;
                repo.ensure_user(email)?;
                Ok(repo.create_session(email)?)
            })
            .await
            .unwrap();
        format!("sessionid={key}")
    }
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('\'', "&#x27;")
}

fn location(response: &Response) -> &str {
    response.headers()[LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn home_page_shows_new_list_form() {
    let app = TestApp::new();

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Start a new To-Do list"));
    assert!(body.contains("action=\"/lists/new\""));
    assert!(body.contains("name=\"text\""));
}

#[tokio::test]
async fn new_list_redirects_to_canonical_path() {
    let app = TestApp::new();

    let response = app.post_form("/lists/new", "text=A+new+list+item", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/lists/1/");
    assert_eq!(app.items(1).await, vec!["A new list item"]);
}

#[tokio::test]
async fn empty_new_list_renders_home_with_error_and_saves_nothing() {
    let app = TestApp::new();

    let response = app.post_form("/lists/new", "text=", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Start a new To-Do list"));
    assert!(body.contains(&escape(EMPTY_ITEM_ERROR)));
    assert_eq!(app.list_count().await, 0);
}

#[tokio::test]
async fn list_page_shows_only_its_own_items() {
    let app = TestApp::new();
    let list_id = app.create_list(&["itemey 1", "itemey 2"]).await;
    app.create_list(&["other list item"]).await;

    let response = app.get(&format!("/lists/{list_id}/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("1: itemey 1"));
    assert!(body.contains("2: itemey 2"));
    assert!(!body.contains("other list item"));
    assert!(body.contains(&format!("action=\"/lists/{list_id}/\"")));
}

#[tokio::test]
async fn post_to_existing_list_saves_and_redirects() {
    let app = TestApp::new();
    app.create_list(&[]).await;
    let list_id = app.create_list(&[]).await;

    let response = app
        .post_form(
            &format!("/lists/{list_id}/"),
            "text=A+new+item+for+an+existing+list",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/lists/{list_id}/"));
    assert_eq!(
        app.items(list_id).await,
        vec!["A new item for an existing list"]
    );
}

#[tokio::test]
async fn blank_item_re_renders_list_page() {
    let app = TestApp::new();
    let list_id = app.create_list(&[]).await;

    let response = app
        .post_form(&format!("/lists/{list_id}/"), "text=+++", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Your To-Do list"));
    assert!(body.contains(&escape(EMPTY_ITEM_ERROR)));
    assert!(app.items(list_id).await.is_empty());
}

#[tokio::test]
async fn duplicate_item_error_ends_up_on_list_page() {
    let app = TestApp::new();
    let list_id = app.create_list(&["textey"]).await;

    let response = app
        .post_form(&format!("/lists/{list_id}/"), "text=textey", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(&escape(DUPLICATE_ITEM_ERROR)));
    assert!(body.contains("value=\"textey\""));
    assert_eq!(app.items(list_id).await.len(), 1);
}

#[tokio::test]
async fn missing_and_non_numeric_lists_are_404() {
    let app = TestApp::new();

    assert_eq!(app.get("/lists/999/").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/lists/abc/").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        app.post_form("/lists/999/", "text=x", None).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.post_form("/lists/999/share", "share=a@b.com", None)
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(app.get("/nowhere").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn logged_in_user_owns_new_list() {
    let app = TestApp::new();
    let cookie = app.login_cookie("a@b.com").await;

    let response = app
        .post_form("/lists/new", "text=new+item", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let owner = app
        .state
        .with_db(|conn| {
            let repo = SqliteListRepository::try_new(conn)?;
            Ok(repo.get_list(1)?.and_then(|list| list.owner))
        })
        .await
        .unwrap();
    assert_eq!(owner.as_deref(), Some("a@b.com"));
}

#[tokio::test]
async fn share_adds_email_and_redirects() {
    let app = TestApp::new();
    let list_id = app.create_list(&["shared item"]).await;

    let response = app
        .post_form(&format!("/lists/{list_id}/share"), "share=C%40D.com", None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/lists/{list_id}/"));

    let body = body_text(app.get(&format!("/lists/{list_id}/")).await).await;
    assert!(body.contains("c@d.com"));
}

#[tokio::test]
async fn invalid_share_target_re_renders_with_error() {
    let app = TestApp::new();
    let list_id = app.create_list(&[]).await;

    let response = app
        .post_form(&format!("/lists/{list_id}/share"), "share=nonsense", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(INVALID_SHARE_ERROR));
    assert!(body.contains("value=\"nonsense\""));
}

#[tokio::test]
async fn my_lists_shows_owned_and_shared_lists() {
    let app = TestApp::new();
    let owner_cookie = app.login_cookie("a@b.com").await;
    app.login_cookie("c@d.com").await;
    app.login_cookie("e@f.com").await;

    let response = app
        .post_form("/lists/new", "text=list+b", Some(&owner_cookie))
        .await;
    let list_path = location(&response).to_string();
    app.post_form(&format!("{list_path}share"), "share=c%40d.com", None)
        .await;

    let owner_page = body_text(app.get("/lists/users/a@b.com/").await).await;
    assert!(owner_page.contains("My lists"));
    assert!(owner_page.contains(&format!("href=\"{list_path}\"")));

    let viewer_page = body_text(app.get("/lists/users/c@d.com/").await).await;
    assert!(viewer_page.contains("Lists shared with me"));
    assert!(viewer_page.contains(&format!("href=\"{list_path}\"")));

    let stranger_page = body_text(app.get("/lists/users/e@f.com/").await).await;
    assert!(!stranger_page.contains(&format!("href=\"{list_path}\"")));
}

#[tokio::test]
async fn list_shared_with_unregistered_email_shows_on_their_page() {
    let app = TestApp::new();

    let response = app.post_form("/lists/new", "text=b", None).await;
    assert_eq!(location(&response), "/lists/1/");
    let response = app.post_form("/lists/1/share", "share=c%40d.com", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.get("/lists/users/c@d.com/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Lists shared with me"));
    assert!(body.contains("href=\"/lists/1/\""));
}

#[tokio::test]
async fn my_lists_for_email_without_lists_is_empty() {
    let app = TestApp::new();
    app.create_list(&["someone else's"]).await;

    let response = app.get("/lists/users/ghost@b.com/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(&escape("ghost@b.com's lists")));
    assert!(!body.contains("href=\"/lists/1/\""));
}

#[tokio::test]
async fn my_lists_for_malformed_email_is_404() {
    let app = TestApp::new();
    let response = app.get("/lists/users/not-an-email/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn my_lists_link_survives_url_delimiters_in_email() {
    let app = TestApp::new();
    let cookie = app.login_cookie("a?b@c.com").await;
    let response = app.post_form("/lists/new", "text=mine", Some(&cookie)).await;
    let list_path = location(&response).to_string();

    let home = app
        .send(
            Request::get("/")
                .header(COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    let body = body_text(home).await;
    assert!(body.contains("href=\"/lists/users/a%3Fb@c.com/\""));

    let response = app.get("/lists/users/a%3Fb@c.com/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(&escape("a?b@c.com's lists")));
    assert!(body.contains(&format!("href=\"{list_path}\"")));
}

#[tokio::test]
async fn login_email_flow_logs_user_in() {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/accounts/send_login_email",
            "email=edith%40example.com",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Check your email"));

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "edith@example.com");
    assert_eq!(sent[0].subject, LOGIN_EMAIL_SUBJECT);
    let url = sent[0]
        .body
        .lines()
        .find(|line| line.starts_with("http://testserver/"))
        .unwrap();
    let path = url.trim_start_matches("http://testserver");

    let response = app.get(path).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let cookie = response.headers()[SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let home = app
        .send(
            Request::get("/")
                .header(COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    let body = body_text(home).await;
    assert!(body.contains("Log out"));
    assert!(body.contains("edith@example.com"));

    let replay = app.get(path).await;
    assert!(replay.headers().get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn invalid_login_email_sends_nothing() {
    let app = TestApp::new();

    let response = app
        .post_form("/accounts/send_login_email", "email=nope", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn logout_ends_session_and_clears_cookie() {
    let app = TestApp::new();
    let cookie = app.login_cookie("a@b.com").await;

    let response = app
        .send(
            Request::get("/accounts/logout")
                .header(COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("Max-Age=0"));

    let home = app
        .send(
            Request::get("/")
                .header(COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    let body = body_text(home).await;
    assert!(!body.contains("Log out"));
    assert!(body.contains("name=\"email\""));
}
