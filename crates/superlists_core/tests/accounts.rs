use superlists_core::db::open_db_in_memory;
use superlists_core::{
    AccountRepository, AccountService, AccountServiceError, ListService, LoginEmail,
    SqliteAccountRepository, SqliteListRepository, LOGIN_EMAIL_SUBJECT,
};

#[test]
fn issued_token_logs_user_in_once() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = AccountService::new(SqliteAccountRepository::try_new(&mut conn).unwrap());

    let token = service.issue_login_token(" Edith@Example.com ").unwrap();
    assert_eq!(token.email, "edith@example.com");

    let user = service
        .redeem_login_token(&token.uid.to_string())
        .unwrap()
        .expect("fresh token should log in");
    assert_eq!(user.email, "edith@example.com");
    assert_eq!(
        service.get_user("EDITH@example.com").unwrap(),
        Some(user.clone())
    );

    let second = service.redeem_login_token(&token.uid.to_string()).unwrap();
    assert_eq!(second, None, "tokens are single use");
}

#[test]
fn unknown_and_malformed_tokens_log_nobody_in() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = AccountService::new(SqliteAccountRepository::try_new(&mut conn).unwrap());

    assert_eq!(service.redeem_login_token("not-a-uuid").unwrap(), None);
    assert_eq!(
        service
            .redeem_login_token("6f1f7a34-0000-4000-8000-000000000000")
            .unwrap(),
        None
    );
}

#[test]
fn invalid_email_cannot_request_token() {
    let mut conn = open_db_in_memory().unwrap();
    let service = AccountService::new(SqliteAccountRepository::try_new(&mut conn).unwrap());

    match service.issue_login_token("nope") {
        Err(AccountServiceError::InvalidEmail(value)) => assert_eq!(value, "nope"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn login_opens_session_that_resolves_to_user() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = AccountService::new(SqliteAccountRepository::try_new(&mut conn).unwrap());

    let token = service.issue_login_token("a@b.com").unwrap();
    let (user, session_key) = service
        .login(&token.uid.to_string())
        .unwrap()
        .expect("login should succeed");

    assert_eq!(
        service.session_user(&session_key).unwrap(),
        Some(user.clone())
    );

    service.end_session(&session_key).unwrap();
    assert_eq!(service.session_user(&session_key).unwrap(), None);
    service.end_session(&session_key).unwrap();
}

#[test]
fn session_requires_registered_user() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&mut conn).unwrap();

    assert!(repo.create_session("ghost@b.com").is_err());
    repo.ensure_user("ghost@b.com").unwrap();
    assert!(repo.create_session("ghost@b.com").is_ok());
}

#[test]
fn logged_in_user_can_own_new_lists() {
    let mut conn = open_db_in_memory().unwrap();
    let email = {
        let mut accounts =
            AccountService::new(SqliteAccountRepository::try_new(&mut conn).unwrap());
        let token = accounts.issue_login_token("owner@b.com").unwrap();
        accounts
            .redeem_login_token(&token.uid.to_string())
            .unwrap()
            .unwrap()
            .email
    };

    let mut lists = ListService::new(SqliteListRepository::try_new(&mut conn).unwrap());
    let (list, _) = lists.new_list(Some(&email), "new item").unwrap();
    assert_eq!(list.owner.as_deref(), Some("owner@b.com"));
}

#[test]
fn login_email_points_at_redeem_endpoint() {
    let mut conn = open_db_in_memory().unwrap();
    let service = AccountService::new(SqliteAccountRepository::try_new(&mut conn).unwrap());

    let token = service.issue_login_token("edith@example.com").unwrap();
    let email = LoginEmail::for_token(&token, "http://localhost:8000");

    assert_eq!(email.subject, LOGIN_EMAIL_SUBJECT);
    assert!(email.body.contains("Use this link to log in"));
    assert!(email
        .body
        .contains(&format!("/accounts/login?token={}", token.uid)));
}
