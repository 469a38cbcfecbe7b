//! Shared test harness: in-memory database, temporary upload directories and a
//! mail transport that records instead of sending.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use bibliotech_server::{
    create_router,
    flash::Flash,
    repository::Repository,
    services::{
        email::{EmailService, MailTransport, OutgoingEmail},
        Services,
    },
    AppConfig, AppResult, AppState,
};
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};
use tower::ServiceExt;

const BOUNDARY: &str = "bibliotech-test-boundary";

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait::async_trait]
impl MailTransport for RecordingMailer {
    async fn deliver(&self, email: OutgoingEmail) -> AppResult<()> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Wait until at least `count` messages went out
    pub async fn wait_for(&self, count: usize) -> Vec<OutgoingEmail> {
        for _ in 0..100 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} emails, got {:?}", count, self.sent());
    }
}

pub struct TestApp {
    pub router: Router,
    pub repository: Repository,
    pub mailer: Arc<RecordingMailer>,
    pub pdf_dir: PathBuf,
    pub profile_dir: PathBuf,
    _dir: tempfile::TempDir,
}

/// A file part of a multipart body
pub struct FilePart<'a> {
    pub field: &'a str,
    pub filename: &'a str,
    pub content: &'a [u8],
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pdf_dir = dir.path().join("pdfs");
        let profile_dir = dir.path().join("profiles");

        let mut config = AppConfig::default();
        config.auth.secret_key = "integration-secret".to_string();
        config.storage.pdf_dir = pdf_dir.to_string_lossy().into_owned();
        config.storage.profile_dir = profile_dir.to_string_lossy().into_owned();

        let repository = Repository::in_memory().await.unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let email = EmailService::new(mailer.clone(), Duration::from_secs(1));
        let services = Services::new(repository.clone(), &config, email).await.unwrap();

        let router = create_router(AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        });

        Self {
            router,
            repository,
            mailer,
            pdf_dir,
            profile_dir,
            _dir: dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, session: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = session {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, session: Option<&str>) -> Response<Body> {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = session {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value, session: Option<&str>) -> Response<Body> {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = session {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        file: Option<FilePart<'_>>,
        session: Option<&str>,
    ) -> Response<Body> {
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(file) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    file.field, file.filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(file.content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::post(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = session {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Register an account and return its session cookie
    pub async fn register(&self, email: &str, password: &str) -> String {
        let response = self
            .post_form(
                "/register",
                &format!("email={email}&name=Tester&password={password}&recovery_answer=Blue"),
                None,
            )
            .await;
        assert_eq!(location(&response), "/");
        session_cookie(&response).expect("registration opens a session")
    }
}

/// `name=value` pairs from the response's Set-Cookie headers, skipping removals
pub fn set_cookies(response: &Response<Body>) -> Vec<(String, String)> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Cookie header value carrying the session set by this response
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .find(|(name, _)| name == "session")
        .map(|(name, value)| format!("{name}={value}"))
}

/// Flash messages queued by this response
pub fn flashes(response: &Response<Body>) -> Vec<Flash> {
    set_cookies(response)
        .into_iter()
        .find(|(name, _)| name == "flash")
        .and_then(|(_, value)| URL_SAFE_NO_PAD.decode(value).ok())
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

pub fn flash_texts(response: &Response<Body>) -> Vec<String> {
    flashes(response).into_iter().map(|f| f.message).collect()
}

pub fn location(response: &Response<Body>) -> String {
    assert_eq!(response.status(), StatusCode::SEE_OTHER, "expected a redirect");
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8_lossy(&body_bytes(response).await).into_owned()
}

/// Strings shown on the pages of a generated PDF, in drawing order
pub fn pdf_text(bytes: &[u8]) -> Vec<String> {
    let doc = lopdf::Document::load_mem(bytes).unwrap();
    let mut shown = Vec::new();
    for page_id in doc.get_pages().into_values() {
        let data = doc.get_page_content(page_id).unwrap();
        let content = lopdf::content::Content::decode(&data).unwrap();
        for op in content.operations.into_iter().filter(|op| op.operator == "Tj") {
            if let Some(lopdf::Object::String(codes, _)) = op.operands.first() {
                let units: Vec<u16> = codes
                    .chunks(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                shown.push(String::from_utf16(&units).unwrap());
            }
        }
    }
    shown
}
