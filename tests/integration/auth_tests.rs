//! Account pages: registration, login, password recovery, profile

use axum::http::StatusCode;
use bibliotech_server::flash::FlashLevel;

use crate::common::{body_text, flash_texts, flashes, location, session_cookie, FilePart, TestApp};

fn reset_token_from(html: &str) -> String {
    let start = html.find("/reset_password/").expect("reset link in email") + "/reset_password/".len();
    html[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

#[tokio::test]
async fn registration_opens_session_and_sends_welcome() {
    let app = TestApp::spawn().await;
    let session = app.register("a@x.com", "secret").await;

    let response = app.get("/", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Library catalog"));

    let sent = app.mailer.wait_for(1).await;
    assert_eq!(sent[0].to, "a@x.com");
    assert_eq!(sent[0].subject, "Welcome to Book-Management-APP!");
}

#[tokio::test]
async fn duplicate_registration_flashes_conflict_and_keeps_one_user() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "secret").await;

    let response = app
        .post_form("/register", "email=a@x.com&name=Other&password=pw&recovery_answer=red", None)
        .await;
    assert_eq!(location(&response), "/register");
    assert_eq!(flash_texts(&response), vec!["Email already registered"]);
    assert!(session_cookie(&response).is_none());

    assert_eq!(app.repository.users.count().await.unwrap(), 1);
}

#[tokio::test]
async fn pages_behind_login_redirect_without_session() {
    let app = TestApp::spawn().await;

    for uri in ["/", "/profile", "/update_profile", "/download_report"] {
        let response = app.get(uri, None).await;
        assert_eq!(location(&response), "/login", "{uri}");
        assert_eq!(flash_texts(&response), vec!["Please log in to access this page."]);
    }

    let response = app.get("/", Some("session=not-a-token")).await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn login_checks_password() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "secret").await;

    let response = app.post_form("/login", "email=a@x.com&password=wrong", None).await;
    assert_eq!(location(&response), "/login");
    let flashed = flashes(&response);
    assert_eq!(flashed[0].level, FlashLevel::Error);
    assert_eq!(flashed[0].message, "Invalid email or password");
    assert!(session_cookie(&response).is_none());

    let response = app.post_form("/login", "email=a@x.com&password=secret", None).await;
    assert_eq!(location(&response), "/");
    assert_eq!(flash_texts(&response), vec!["Login successful!"]);
    assert!(session_cookie(&response).is_some());
}

#[tokio::test]
async fn login_page_shows_pending_flash() {
    let app = TestApp::spawn().await;
    let response = app.post_form("/login", "email=ghost@x.com&password=x", None).await;
    let flash_cookie = response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("flash="))
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string();

    let page = app.get("/login", Some(&flash_cookie)).await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(body_text(page).await.contains("Invalid email or password"));
}

#[tokio::test]
async fn logout_is_idempotent() {
    let app = TestApp::spawn().await;

    let response = app.get("/logout", None).await;
    assert_eq!(location(&response), "/login");
    assert_eq!(flash_texts(&response), vec!["Logged out successfully."]);

    let session = app.register("a@x.com", "secret").await;
    let response = app.get("/logout", Some(&session)).await;
    assert_eq!(location(&response), "/login");
    assert!(session_cookie(&response).is_none());
}

#[tokio::test]
async fn password_reset_round_trip() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "secret").await;
    app.mailer.wait_for(1).await;

    let response = app.post_form("/forgot_password", "username=a@x.com", None).await;
    assert_eq!(location(&response), "/login");
    assert_eq!(
        flash_texts(&response),
        vec!["A password reset link has been sent to your registered email address."]
    );

    let sent = app.mailer.wait_for(2).await;
    assert_eq!(sent[1].subject, "Password Reset Request");
    let token = reset_token_from(&sent[1].html);
    assert_eq!(token.len(), 43);

    let page = app.get(&format!("/reset_password/{token}"), None).await;
    assert_eq!(page.status(), StatusCode::OK);

    let response = app
        .post_form(&format!("/reset_password/{token}"), "password=brand-new", None)
        .await;
    assert_eq!(location(&response), "/login");
    assert_eq!(
        flash_texts(&response),
        vec!["Your password has been successfully updated. Please log in."]
    );

    let sent = app.mailer.wait_for(3).await;
    assert_eq!(sent[2].subject, "Password Changed Successfully");

    let response = app.post_form("/login", "email=a@x.com&password=brand-new", None).await;
    assert_eq!(location(&response), "/");

    // Single use
    let response = app.get(&format!("/reset_password/{token}"), None).await;
    assert_eq!(location(&response), "/forgot_password");
}

#[tokio::test]
async fn unknown_reset_token_never_changes_password() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "secret").await;

    let response = app.get("/reset_password/bogus", None).await;
    assert_eq!(location(&response), "/forgot_password");
    assert_eq!(
        flash_texts(&response),
        vec!["The password reset link is invalid or has expired."]
    );

    let response = app.post_form("/reset_password/bogus", "password=hacked", None).await;
    assert_eq!(location(&response), "/forgot_password");

    let response = app.post_form("/login", "email=a@x.com&password=secret", None).await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn forgot_password_for_unknown_username() {
    let app = TestApp::spawn().await;

    let response = app.post_form("/forgot_password", "username=ghost@x.com", None).await;
    assert_eq!(location(&response), "/login");
    assert_eq!(flash_texts(&response), vec!["No account found with that username."]);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn profile_update_stores_picture_and_rejects_taken_username() {
    let app = TestApp::spawn().await;
    let session = app.register("a@x.com", "secret").await;
    app.register("b@x.com", "secret").await;

    let response = app
        .post_multipart(
            "/update_profile",
            &[("name", "Ann"), ("username", "b@x.com"), ("password", "")],
            Some(FilePart { field: "profile_pic", filename: "me.png", content: b"png" }),
            Some(&session),
        )
        .await;
    assert_eq!(location(&response), "/update_profile");
    assert_eq!(flash_texts(&response), vec!["Username already taken."]);
    assert_eq!(std::fs::read_dir(&app.profile_dir).unwrap().count(), 0);

    let response = app
        .post_multipart(
            "/update_profile",
            &[("name", "Ann"), ("username", "a@x.com"), ("password", "")],
            Some(FilePart { field: "profile_pic", filename: "my photo.png", content: b"png" }),
            Some(&session),
        )
        .await;
    assert_eq!(location(&response), "/profile");
    assert_eq!(flash_texts(&response), vec!["Profile updated successfully!"]);

    let user = app.repository.users.get_by_email("a@x.com").await.unwrap().unwrap();
    let stored = format!("user_{}_my_photo.png", user.id);
    assert_eq!(user.profile_pic.as_deref(), Some(stored.as_str()));
    assert_eq!(user.name.as_deref(), Some("Ann"));
    assert!(app.profile_dir.join(&stored).exists());

    let served = app.get(&format!("/static/profiles/{stored}"), None).await;
    assert_eq!(served.status(), StatusCode::OK);

    // Blank password keeps the old one
    let response = app.post_form("/login", "email=a@x.com&password=secret", None).await;
    assert_eq!(location(&response), "/");

    let response = app.send(
        axum::http::Request::post("/remove_profile_pic")
            .header(axum::http::header::COOKIE, &session)
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(location(&response), "/profile");
    assert_eq!(flash_texts(&response), vec!["Profile picture removed!"]);
    assert!(!app.profile_dir.join(&stored).exists());
}

#[tokio::test]
async fn delete_account_removes_user_and_ends_session() {
    let app = TestApp::spawn().await;
    let session = app.register("a@x.com", "secret").await;
    app.mailer.wait_for(1).await;

    let response = app.send(
        axum::http::Request::post("/delete_account")
            .header(axum::http::header::COOKIE, &session)
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(location(&response), "/login");
    assert_eq!(flash_texts(&response), vec!["Your account has been permanently deleted."]);
    assert_eq!(app.repository.users.count().await.unwrap(), 0);

    let sent = app.mailer.wait_for(2).await;
    assert_eq!(sent[1].subject, "Account Deletion Confirmation");

    let response = app.get("/", Some(&session)).await;
    assert_eq!(location(&response), "/login");
}
