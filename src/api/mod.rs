//! HTTP handlers for BiblioTech pages and endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;
pub mod profile;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    Multipart,
};
use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    flash::{self, Flash},
    models::{Upload, User},
    AppState,
};

pub const SESSION_COOKIE: &str = "session";

/// Extractor for the signed-in user, resolved from the session cookie
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| AppError::Authentication("Missing session cookie".to_string()))?;

        let user = state.services.users.resolve_session(&token).await?;
        Ok(AuthenticatedUser(user))
    }
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Open a session for the user
pub fn start_session(state: &AppState, jar: CookieJar, user: &User) -> AppResult<CookieJar> {
    let token = state.services.users.create_session_token(user)?;
    Ok(jar.add(session_cookie(token)))
}

/// Drop the session cookie
pub fn end_session(jar: CookieJar) -> CookieJar {
    jar.remove(session_cookie(String::new()))
}

/// Queue a flash message and redirect
pub fn flash_redirect(jar: CookieJar, flash: Flash, to: &str) -> Response {
    (flash::push(jar, flash), Redirect::to(to)).into_response()
}

/// Text fields and files of a multipart submission
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, Upload>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
                    form.files.insert(
                        name,
                        Upload {
                            filename,
                            content: content.to_vec(),
                        },
                    );
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Failed to read field: {}", e)))?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Take a file, ignoring file inputs submitted without a selection
    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name).filter(|u| !u.filename.is_empty())
    }
}
