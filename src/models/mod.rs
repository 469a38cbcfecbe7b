//! Data models for BiblioTech

pub mod book;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookStatus, CatalogSummary, CreateBook};
pub use user::{NewUser, SessionClaims, Upload, User};
