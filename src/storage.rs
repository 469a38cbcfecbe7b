//! Upload directories and filename sanitizing

use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use unicode_normalization::UnicodeNormalization;

use crate::error::{AppError, AppResult};

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("static regex"));

const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3",
];

/// Reduce a client-supplied filename to a flat, ASCII-only name safe to join onto a directory.
///
/// Non-ASCII characters are decomposed and dropped, path separators become spaces,
/// whitespace runs become `_`, and anything outside `[A-Za-z0-9_.-]` is removed.
/// Leading and trailing `.`/`_` are trimmed so the result can never be `..` or hidden.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename.nfkd().filter(|c| c.is_ascii()).collect();
    let flattened = ascii.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_CHARS.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_').to_string();

    let stem = trimmed.split('.').next().unwrap_or_default().to_uppercase();
    if !trimmed.is_empty() && WINDOWS_DEVICE_NAMES.contains(&stem.as_str()) {
        return format!("_{}", trimmed);
    }

    trimmed
}

/// Case-insensitive extension check on the client-supplied name
pub fn has_extension(filename: &str, extension: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// A directory of uploaded files, addressed by stored filename only
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the directory if needed
    pub async fn init(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> AppResult<PathBuf> {
        let path = Path::new(name);
        let flat = path.components().count() == 1
            && path.file_name().map(|f| f == path.as_os_str()).unwrap_or(false);
        if name.is_empty() || !flat {
            return Err(AppError::BadRequest(format!("Invalid stored filename: {}", name)));
        }
        Ok(self.root.join(name))
    }

    pub async fn save(&self, name: &str, content: &[u8]) -> AppResult<()> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, content).await?;
        tracing::debug!("Stored upload {}", path.display());
        Ok(())
    }

    /// Remove a stored file. A missing file is not an error.
    pub async fn remove(&self, name: &str) -> AppResult<()> {
        let path = self.resolve(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Removed upload {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, name: &str) -> bool {
        match self.resolve(name) {
            Ok(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}
