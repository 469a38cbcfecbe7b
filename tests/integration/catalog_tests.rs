//! Dashboard, catalog mutations, uploads and the PDF report

use axum::http::{header, StatusCode};
use bibliotech_server::models::BookStatus;
use serde_json::{json, Value};

use crate::common::{
    body_bytes, body_text, flash_texts, location, pdf_text, set_cookies, FilePart, TestApp,
};

async fn add_book(app: &TestApp, session: &str, title: &str, author: &str) -> i64 {
    let response = app
        .post_json(
            "/api/add",
            json!({ "title": title, "author": author, "category": "Fiction" }),
            Some(session),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let books = app.repository.books.list().await.unwrap();
    books.last().unwrap().id
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = TestApp::spawn().await;
    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn api_add_creates_available_book() {
    let app = TestApp::spawn().await;
    let session = app.register("a@x.com", "secret").await;

    let response = app
        .post_json(
            "/api/add",
            json!({ "title": "Dune", "author": "Frank Herbert", "category": "Sci-Fi" }),
            Some(&session),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body, json!({ "status": "success", "message": "Book added successfully!" }));

    let books = app.repository.books.list().await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].status, BookStatus::Available);

    let page = body_text(app.get("/", Some(&session)).await).await;
    assert!(page.contains("Dune"));
    assert!(page.contains("Total: 1"));
}

#[tokio::test]
async fn api_add_rejects_empty_fields() {
    let app = TestApp::spawn().await;
    let session = app.register("a@x.com", "secret").await;

    let response = app
        .post_json(
            "/api/add",
            json!({ "title": "", "author": "Someone", "category": "Fiction" }),
            Some(&session),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "error");
    assert!(app.repository.books.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn api_add_reports_missing_fields_as_json() {
    let app = TestApp::spawn().await;
    let session = app.register("a@x.com", "secret").await;

    let response = app.post_json("/api/add", json!({ "title": "Dune" }), Some(&session)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("author"));

    let response = app
        .send(
            axum::http::Request::post("/api/add")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, &session)
                .body(axum::body::Body::from("{\"title\": "))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "error");

    assert!(app.repository.books.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn api_add_requires_session() {
    let app = TestApp::spawn().await;
    let response = app
        .post_json("/api/add", json!({ "title": "Dune", "author": "F", "category": "S" }), None)
        .await;
    assert_eq!(location(&response), "/login");
    assert!(app.repository.books.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn issue_and_return_transition_only_when_allowed() {
    let app = TestApp::spawn().await;
    let session = app.register("a@x.com", "secret").await;
    let id = add_book(&app, &session, "Dune", "Frank Herbert").await;

    let response = app.get(&format!("/return/{id}"), Some(&session)).await;
    assert_eq!(location(&response), "/");
    assert!(flash_texts(&response).is_empty());

    let response = app.get(&format!("/issue/{id}"), Some(&session)).await;
    assert_eq!(flash_texts(&response), vec!["Book issued successfully."]);
    let book = app.repository.books.get(id).await.unwrap().unwrap();
    assert_eq!(book.status, BookStatus::Borrowed);

    let response = app.get(&format!("/issue/{id}"), Some(&session)).await;
    assert_eq!(location(&response), "/");
    assert!(flash_texts(&response).is_empty());

    let response = app.get(&format!("/return/{id}"), Some(&session)).await;
    assert_eq!(flash_texts(&response), vec!["Book successfully returned!"]);
    let book = app.repository.books.get(id).await.unwrap().unwrap();
    assert_eq!(book.status, BookStatus::Available);
}

#[tokio::test]
async fn unknown_book_ids_are_not_found() {
    let app = TestApp::spawn().await;
    let session = app.register("a@x.com", "secret").await;

    for uri in ["/issue/42", "/return/42", "/delete/42"] {
        let response = app.get(uri, Some(&session)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let response = app
        .post_multipart(
            "/upload_pdf/42",
            &[],
            Some(FilePart { field: "file", filename: "a.pdf", content: b"%PDF-1.4" }),
            Some(&session),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(std::fs::read_dir(&app.pdf_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn non_pdf_upload_changes_nothing() {
    let app = TestApp::spawn().await;
    let session = app.register("a@x.com", "secret").await;
    let id = add_book(&app, &session, "Dune", "Frank Herbert").await;

    let response = app
        .post_multipart(
            &format!("/upload_pdf/{id}"),
            &[],
            Some(FilePart { field: "file", filename: "notes.txt", content: b"hello" }),
            Some(&session),
        )
        .await;
    assert_eq!(location(&response), "/");
    assert_eq!(
        flash_texts(&response),
        vec!["Invalid file or file type. Only PDF is allowed."]
    );

    let response = app
        .post_multipart(&format!("/upload_pdf/{id}"), &[("submit", "Upload")], None, Some(&session))
        .await;
    assert_eq!(
        flash_texts(&response),
        vec!["Invalid file or file type. Only PDF is allowed."]
    );

    assert!(app.repository.books.get(id).await.unwrap().unwrap().pdf_file.is_none());
    assert_eq!(std::fs::read_dir(&app.pdf_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn deleting_a_book_removes_its_pdf() {
    let app = TestApp::spawn().await;
    let session = app.register("a@x.com", "secret").await;
    let id = add_book(&app, &session, "Dune", "Frank Herbert").await;

    let response = app
        .post_multipart(
            &format!("/upload_pdf/{id}"),
            &[],
            Some(FilePart { field: "file", filename: "Dune Notes.PDF", content: b"%PDF-1.4 body" }),
            Some(&session),
        )
        .await;
    assert_eq!(location(&response), "/");
    assert_eq!(flash_texts(&response), vec!["PDF uploaded successfully!"]);

    let stored = format!("book_{id}_Dune_Notes.PDF");
    let book = app.repository.books.get(id).await.unwrap().unwrap();
    assert_eq!(book.pdf_file.as_deref(), Some(stored.as_str()));
    assert!(app.pdf_dir.join(&stored).exists());

    let served = app.get(&format!("/static/pdfs/{stored}"), None).await;
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(body_bytes(served).await, b"%PDF-1.4 body");

    let response = app.get(&format!("/delete/{id}"), Some(&session)).await;
    assert_eq!(flash_texts(&response), vec!["Book successfully deleted!"]);
    assert!(app.repository.books.get(id).await.unwrap().is_none());
    assert!(!app.pdf_dir.join(&stored).exists());
}

#[tokio::test]
async fn report_is_a_pdf_attachment_with_truncated_cells() {
    let app = TestApp::spawn().await;
    let session = app.register("a@x.com", "secret").await;
    add_book(&app, &session, &"T".repeat(50), "A").await;

    let response = app.get("/download_report", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Library_Catalog.pdf\""
    );
    assert!(set_cookies(&response).is_empty());

    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(b"%PDF-"));
    let shown = pdf_text(&bytes);
    assert_eq!(shown[0], "BiblioTech Library Report");
    assert!(shown.contains(&format!("{}...", "T".repeat(35))));
    assert!(!shown.iter().any(|text| text.contains(&"T".repeat(36))));
    assert!(shown.contains(&"A".to_string()));

    // Same table, same bytes
    let again = body_bytes(app.get("/download_report", Some(&session)).await).await;
    assert_eq!(bytes, again);
}

#[tokio::test]
async fn report_keeps_non_latin_text() {
    let app = TestApp::spawn().await;
    let session = app.register("a@x.com", "secret").await;
    let response = app
        .post_json(
            "/api/add",
            json!({
                "title": "Трудно быть богом",
                "author": "Стругацкие",
                "category": "Научная фантастика"
            }),
            Some(&session),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = body_bytes(app.get("/download_report", Some(&session)).await).await;
    let shown = pdf_text(&bytes);
    assert!(shown.contains(&"Трудно быть богом".to_string()));
    assert!(shown.contains(&"Научная фантастика".to_string()));
}
