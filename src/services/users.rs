//! Authentication and account management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{NewUser, RegisterForm, SessionClaims, UpdateProfile, User},
    repository::Repository,
    services::email::{EmailService, EmailTemplate},
    storage::{secure_filename, FileStore},
};

pub const EMAIL_TAKEN: &str = "Email already registered";
pub const USERNAME_TAKEN: &str = "Username already taken.";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const INVALID_RESET_LINK: &str = "The password reset link is invalid or has expired.";

/// Where notices and reset links are mailed
#[derive(Debug, Clone, Default)]
pub struct NotificationRouting {
    /// Base URL used to build absolute reset links
    pub public_url: String,
    /// Fixed administrative mailbox; when unset the account owner is used
    pub admin_recipient: Option<String>,
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
    email: EmailService,
    profiles: FileStore,
    routing: NotificationRouting,
}

/// 32 random bytes, URL-safe base64 without padding
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Only the digest of a reset token is persisted
fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl UsersService {
    pub fn new(
        repository: Repository,
        config: AuthConfig,
        email: EmailService,
        profiles: FileStore,
        routing: NotificationRouting,
    ) -> Self {
        Self {
            repository,
            config,
            email,
            profiles,
            routing,
        }
    }

    fn notice_recipient<'a>(&'a self, user: &'a User) -> &'a str {
        self.routing.admin_recipient.as_deref().unwrap_or(&user.email)
    }

    /// Create an account. The caller opens the session for the returned user.
    pub async fn register(&self, form: RegisterForm) -> AppResult<User> {
        let form = RegisterForm {
            email: form.email.trim().to_string(),
            name: form.name.trim().to_string(),
            recovery_answer: form.recovery_answer.trim().to_lowercase(),
            ..form
        };
        form.validate()?;
        let email = form.email.clone();

        if self.repository.users.email_exists(&email, None).await? {
            return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let name = Some(form.name).filter(|n| !n.is_empty());
        let new_user = NewUser {
            email: email.clone(),
            name: name.clone(),
            password_hash: self.hash_password(&form.password)?,
            recovery_answer: form.recovery_answer,
        };

        let user = self.repository.users.create(&new_user).await.map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict(EMAIL_TAKEN.to_string()),
            other => other,
        })?;

        tracing::info!("Registered user id={}", user.id);

        self.email.send(
            "Welcome to Book-Management-APP!",
            &user.email,
            EmailTemplate::Welcome {
                name: name.unwrap_or_else(|| email.clone()),
                username: email,
            },
        );

        Ok(user)
    }

    /// Check credentials
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let user = self
            .repository
            .users
            .get_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        Ok(user)
    }

    /// Signed session token for the user
    pub fn create_session_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.session_hours as i64 * 3600);

        let claims = SessionClaims {
            sub: user.email.clone(),
            user_id: user.id,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.secret_key)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Resolve a session token to a live account
    pub async fn resolve_session(&self, token: &str) -> AppResult<User> {
        let claims = SessionClaims::from_token(token, &self.config.secret_key)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        self.repository
            .users
            .get_by_id(claims.user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("Account no longer exists".to_string()))
    }

    /// Issue a reset token for the account with this username (its email).
    ///
    /// Returns the raw token when an account matched, `None` otherwise.
    pub async fn request_password_reset(&self, username: &str) -> AppResult<Option<String>> {
        let username = username.trim();
        let Some(user) = self.repository.users.get_by_email(username).await? else {
            tracing::info!("Password reset requested for unknown account");
            return Ok(None);
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(self.config.reset_token_minutes);
        self.repository
            .users
            .set_reset_token(user.id, &hash_reset_token(&token), expires_at)
            .await?;

        let reset_url = format!(
            "{}/reset_password/{}",
            self.routing.public_url.trim_end_matches('/'),
            token
        );

        self.email.send(
            "Password Reset Request",
            self.notice_recipient(&user),
            EmailTemplate::ResetLink {
                username: user.email.clone(),
                reset_url,
            },
        );

        tracing::info!("Issued password reset token for user id={}", user.id);
        Ok(Some(token))
    }

    /// Account holding a live reset token. Expired tokens are cleared on sight.
    pub async fn check_reset_token(&self, token: &str) -> AppResult<User> {
        let invalid = || AppError::Validation(INVALID_RESET_LINK.to_string());

        let user = self
            .repository
            .users
            .get_by_reset_token(&hash_reset_token(token))
            .await?
            .ok_or_else(invalid)?;

        match user.token_expiration {
            Some(expires_at) if expires_at > Utc::now() => Ok(user),
            _ => {
                self.repository.users.clear_reset_token(user.id).await?;
                tracing::info!("Discarded expired reset token for user id={}", user.id);
                Err(invalid())
            }
        }
    }

    /// Consume a reset token and set a new password
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let user = self.check_reset_token(token).await?;

        if new_password.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }

        let hash = self.hash_password(new_password)?;
        self.repository.users.set_password(user.id, &hash).await?;

        tracing::info!("Password reset completed for user id={}", user.id);

        self.email.send(
            "Password Changed Successfully",
            self.notice_recipient(&user),
            EmailTemplate::PasswordResetConfirmation {
                username: user.email.clone(),
            },
        );

        Ok(())
    }

    /// Update the current user's own profile
    pub async fn update_profile(&self, user: &User, profile: UpdateProfile) -> AppResult<User> {
        profile.validate()?;
        let username = profile.username.trim();

        if self.repository.users.email_exists(username, Some(user.id)).await? {
            return Err(AppError::Conflict(USERNAME_TAKEN.to_string()));
        }

        let password = match profile.password.as_deref() {
            Some(p) if !p.is_empty() => Some(self.hash_password(p)?),
            _ => None,
        };

        let new_pic = match profile.profile_pic {
            Some(upload) if !upload.filename.is_empty() => {
                let stored = format!("user_{}_{}", user.id, secure_filename(&upload.filename));
                self.profiles.save(&stored, &upload.content).await?;
                Some(stored)
            }
            _ => None,
        };

        let name = profile
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let result = self
            .repository
            .users
            .update_profile(user.id, name.as_deref(), username, password.as_deref(), new_pic.as_deref())
            .await;

        let replaced = new_pic.as_deref().filter(|new| user.profile_pic.as_deref() != Some(*new));
        match result {
            Ok(updated) => {
                // The previous picture is dropped once the new reference is stored
                if let (Some(_), Some(old)) = (replaced, user.profile_pic.as_deref()) {
                    if let Err(e) = self.profiles.remove(old).await {
                        tracing::warn!("Could not remove replaced picture {}: {}", old, e);
                    }
                }
                tracing::info!("Updated profile for user id={}", user.id);
                Ok(updated)
            }
            Err(e) => {
                if let Some(new) = replaced {
                    if let Err(cleanup) = self.profiles.remove(new).await {
                        tracing::warn!("Could not remove unsaved picture {}: {}", new, cleanup);
                    }
                }
                Err(match e {
                    AppError::Conflict(_) => AppError::Conflict(USERNAME_TAKEN.to_string()),
                    other => other,
                })
            }
        }
    }

    /// Delete the stored picture. Returns false when none was set.
    pub async fn remove_profile_pic(&self, user: &User) -> AppResult<bool> {
        let Some(ref pic) = user.profile_pic else {
            return Ok(false);
        };

        self.profiles.remove(pic).await?;
        self.repository.users.set_profile_pic(user.id, None).await?;
        Ok(true)
    }

    /// Remove the account together with its picture
    pub async fn delete_account(&self, user: &User) -> AppResult<()> {
        if let Some(ref pic) = user.profile_pic {
            self.profiles.remove(pic).await?;
        }

        if !self.repository.users.delete(user.id).await? {
            return Err(AppError::NotFound(format!("User with id {} not found", user.id)));
        }

        tracing::info!("Deleted account id={}", user.id);

        self.email.send(
            "Account Deletion Confirmation",
            self.notice_recipient(user),
            EmailTemplate::DeleteConfirmation {
                username: user.email.clone(),
                user_id: user.id,
            },
        );

        Ok(())
    }

    /// Verify user password
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
