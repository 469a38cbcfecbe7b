//! Dashboard and book catalog endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::{cookie::CookieJar, Multipart};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    flash::{self, Flash},
    models::book::CreateBook,
    report::REPORT_FILENAME,
    views::pages,
    AppState,
};

use super::{flash_redirect, AuthenticatedUser, MultipartForm};

/// Outcome of a JSON catalog call
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    /// "success" or "error"
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

pub async fn dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: CookieJar,
) -> AppResult<Response> {
    let (books, summary) = state.services.catalog.dashboard().await?;
    let (jar, flashes) = flash::take(jar);
    Ok((jar, pages::dashboard(&user, &books, &summary, &flashes)).into_response())
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/api/add",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 200, description = "Book added", body = StatusResponse),
        (status = 400, description = "Missing or invalid field", body = StatusResponse),
        (status = 303, description = "No session, redirected to the login page")
    )
)]
pub async fn api_add(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    payload: Result<Json<CreateBook>, JsonRejection>,
) -> AppResult<(StatusCode, Json<StatusResponse>)> {
    let Json(book) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return Ok((StatusCode::BAD_REQUEST, Json(StatusResponse::error(rejection.body_text()))))
        }
    };

    match state.services.catalog.add_book(book).await {
        Ok(_) => Ok((StatusCode::OK, Json(StatusResponse::success("Book added successfully!")))),
        Err(AppError::Validation(msg)) => Ok((StatusCode::BAD_REQUEST, Json(StatusResponse::error(msg)))),
        Err(e) => Err(e),
    }
}

pub async fn upload_pdf(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    jar: CookieJar,
    Path(book_id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Response> {
    let mut form = MultipartForm::read(multipart).await?;

    match state.services.catalog.upload_pdf(book_id, form.take_file("file")).await {
        Ok(_) => Ok(flash_redirect(jar, Flash::success("PDF uploaded successfully!"), "/")),
        Err(AppError::Validation(msg)) => Ok(flash_redirect(jar, Flash::error(msg), "/")),
        Err(e) => Err(e),
    }
}

pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    state.services.catalog.delete_book(id).await?;
    Ok(flash_redirect(jar, Flash::success("Book successfully deleted!"), "/"))
}

pub async fn issue_book(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    if state.services.catalog.issue_book(id).await? {
        return Ok(flash_redirect(jar, Flash::success("Book issued successfully."), "/"));
    }
    Ok(Redirect::to("/").into_response())
}

pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    if state.services.catalog.return_book(id).await? {
        return Ok(flash_redirect(jar, Flash::success("Book successfully returned!"), "/"));
    }
    Ok(Redirect::to("/").into_response())
}

pub async fn download_report(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> AppResult<Response> {
    let pdf = state.services.reports.catalog_pdf().await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", REPORT_FILENAME),
            ),
        ],
        pdf,
    )
        .into_response())
}
