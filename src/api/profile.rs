//! Profile pages of the signed-in user

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{cookie::CookieJar, Multipart};

use crate::{
    error::{AppError, AppResult},
    flash::{self, Flash},
    models::user::UpdateProfile,
    views::pages,
    AppState,
};

use super::{end_session, flash_redirect, AuthenticatedUser, MultipartForm};

pub async fn profile_page(AuthenticatedUser(user): AuthenticatedUser, jar: CookieJar) -> Response {
    let (jar, flashes) = flash::take(jar);
    (jar, pages::profile(&user, &flashes)).into_response()
}

pub async fn update_profile_page(AuthenticatedUser(user): AuthenticatedUser, jar: CookieJar) -> Response {
    let (jar, flashes) = flash::take(jar);
    (jar, pages::update_profile(&user, &flashes)).into_response()
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: CookieJar,
    multipart: Multipart,
) -> AppResult<Response> {
    let mut form = MultipartForm::read(multipart).await?;

    let update = UpdateProfile {
        name: form.field("name").map(str::to_string),
        username: form.field("username").unwrap_or_default().to_string(),
        password: form.field("password").map(str::to_string),
        profile_pic: form.take_file("profile_pic"),
    };

    match state.services.users.update_profile(&user, update).await {
        Ok(_) => Ok(flash_redirect(jar, Flash::success("Profile updated successfully!"), "/profile")),
        Err(AppError::Conflict(msg) | AppError::Validation(msg)) => {
            Ok(flash_redirect(jar, Flash::error(msg), "/update_profile"))
        }
        Err(e) => Err(e),
    }
}

pub async fn remove_profile_pic(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: CookieJar,
) -> AppResult<Response> {
    if state.services.users.remove_profile_pic(&user).await? {
        return Ok(flash_redirect(jar, Flash::success("Profile picture removed!"), "/profile"));
    }
    Ok(Redirect::to("/profile").into_response())
}

pub async fn delete_account(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: CookieJar,
) -> AppResult<Response> {
    state.services.users.delete_account(&user).await?;
    Ok(flash_redirect(
        end_session(jar),
        Flash::success("Your account has been permanently deleted."),
        "/login",
    ))
}
