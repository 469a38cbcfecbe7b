//! BiblioTech Library Catalog
//!
//! A small server-rendered web application for a library administrator:
//! accounts with password recovery, a book catalog with PDF attachments,
//! a printable catalog report and email notifications.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod api;
pub mod config;
pub mod error;
pub mod flash;
pub mod models;
pub mod report;
pub mod repository;
pub mod services;
pub mod storage;
pub mod views;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let storage = &state.config.storage;
    let body_limit = storage.max_upload_bytes;
    let pdfs = ServeDir::new(&storage.pdf_dir);
    let profiles = ServeDir::new(&storage.profile_dir);

    let app = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Authentication
        .route("/login", get(api::auth::login_page).post(api::auth::login))
        .route("/register", get(api::auth::register_page).post(api::auth::register))
        .route("/logout", get(api::auth::logout))
        .route(
            "/forgot_password",
            get(api::auth::forgot_password_page).post(api::auth::forgot_password),
        )
        .route(
            "/reset_password/:token",
            get(api::auth::reset_password_page).post(api::auth::reset_password),
        )
        // Profile
        .route("/profile", get(api::profile::profile_page))
        .route(
            "/update_profile",
            get(api::profile::update_profile_page).post(api::profile::update_profile),
        )
        .route("/remove_profile_pic", post(api::profile::remove_profile_pic))
        .route("/delete_account", post(api::profile::delete_account))
        // Catalog
        .route("/", get(api::books::dashboard))
        .route("/api/add", post(api::books::api_add))
        .route("/upload_pdf/:book_id", post(api::books::upload_pdf))
        .route("/delete/:id", get(api::books::delete_book))
        .route("/issue/:id", get(api::books::issue_book))
        .route("/return/:id", get(api::books::return_book))
        .route("/download_report", get(api::books::download_report))
        // Uploaded files
        .nest_service("/static/pdfs", pdfs)
        .nest_service("/static/profiles", profiles)
        .with_state(state);

    Router::new()
        .merge(app)
        .merge(api::openapi::create_openapi_router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
