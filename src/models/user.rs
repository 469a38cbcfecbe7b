//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Library administrator account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    /// Login identity, unique across accounts
    pub email: String,
    pub name: Option<String>,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    /// Stored filename of the profile picture, relative to the profile directory
    pub profile_pic: Option<String>,
    #[serde(skip_serializing)]
    pub recovery_answer: String,
    /// SHA-256 of the outstanding reset token
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub token_expiration: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// Registration form
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(length(min = 1, message = "Recovery answer is required"))]
    pub recovery_answer: String,
}

/// Login form
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Forgot password form; the username is the account email
#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub username: String,
}

/// Reset password form
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPasswordForm {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Profile update, assembled from the multipart form
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateProfile {
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub username: String,
    /// New password; empty means unchanged
    pub password: Option<String>,
    pub profile_pic: Option<Upload>,
}

/// A file received from a multipart form
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Data needed to insert a new user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub recovery_answer: String,
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub user_id: i64,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    /// Create a new session token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse a session token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}
