//! Login, registration and password recovery pages

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    error::{AppError, AppResult},
    flash::{self, Flash},
    models::user::{ForgotPasswordForm, LoginForm, RegisterForm, ResetPasswordForm},
    services::users::{INVALID_CREDENTIALS, INVALID_RESET_LINK},
    views::pages,
    AppState,
};

use super::{end_session, flash_redirect, start_session};

pub async fn login_page(jar: CookieJar) -> Response {
    let (jar, flashes) = flash::take(jar);
    (jar, pages::login(&flashes)).into_response()
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let user = match state.services.users.authenticate(&form.email, &form.password).await {
        Ok(user) => user,
        Err(AppError::Authentication(_)) => {
            tracing::info!("Failed login attempt");
            return Ok(flash_redirect(jar, Flash::error(INVALID_CREDENTIALS), "/login"));
        }
        Err(e) => return Err(e),
    };

    let jar = start_session(&state, jar, &user)?;
    tracing::info!("User id={} logged in", user.id);
    Ok(flash_redirect(jar, Flash::success("Login successful!"), "/"))
}

pub async fn register_page(jar: CookieJar) -> Response {
    let (jar, flashes) = flash::take(jar);
    (jar, pages::register(&flashes)).into_response()
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let user = match state.services.users.register(form).await {
        Ok(user) => user,
        Err(AppError::Conflict(msg) | AppError::Validation(msg)) => {
            return Ok(flash_redirect(jar, Flash::error(msg), "/register"));
        }
        Err(e) => return Err(e),
    };

    let jar = start_session(&state, jar, &user)?;
    Ok(flash_redirect(jar, Flash::success("Account created successfully!"), "/"))
}

pub async fn logout(jar: CookieJar) -> Response {
    flash_redirect(end_session(jar), Flash::success("Logged out successfully."), "/login")
}

pub async fn forgot_password_page(jar: CookieJar) -> Response {
    let (jar, flashes) = flash::take(jar);
    (jar, pages::forgot_password(&flashes)).into_response()
}

pub async fn forgot_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ForgotPasswordForm>,
) -> AppResult<Response> {
    let flash = match state.services.users.request_password_reset(&form.username).await? {
        Some(_) => Flash::success("A password reset link has been sent to your registered email address."),
        None => Flash::error("No account found with that username."),
    };
    Ok(flash_redirect(jar, flash, "/login"))
}

pub async fn reset_password_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(token): Path<String>,
) -> AppResult<Response> {
    match state.services.users.check_reset_token(&token).await {
        Ok(_) => {
            let (jar, flashes) = flash::take(jar);
            Ok((jar, pages::reset_password(&token, &flashes)).into_response())
        }
        Err(AppError::Validation(msg)) => Ok(flash_redirect(jar, Flash::error(msg), "/forgot_password")),
        Err(e) => Err(e),
    }
}

pub async fn reset_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> AppResult<Response> {
    match state.services.users.reset_password(&token, &form.password).await {
        Ok(()) => Ok(flash_redirect(
            jar,
            Flash::success("Your password has been successfully updated. Please log in."),
            "/login",
        )),
        Err(AppError::Validation(msg)) if msg == INVALID_RESET_LINK => {
            Ok(flash_redirect(jar, Flash::error(msg), "/forgot_password"))
        }
        Err(AppError::Validation(msg)) => {
            Ok(flash_redirect(jar, Flash::error(msg), &format!("/reset_password/{}", token)))
        }
        Err(e) => Err(e),
    }
}
