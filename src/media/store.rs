use super::path::{PathRejected, resolve_media_path};
use crate::errors::AppResult;
use crate::models::MediaKind;
use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Storage for screenshot and recording files.
///
/// `save` is used when media is captured; the inverse operations are only
/// used by the retention purge.
pub trait MediaStore {
    /// Persist `bytes` and return the public URL recorded on the row.
    fn save(&self, kind: MediaKind, bytes: &[u8], suggested_name: &str) -> AppResult<String>;

    /// Map a stored URL back to a file inside the store.
    fn resolve(&self, url: &str) -> Result<PathBuf, PathRejected>;

    /// True when `path` is an existing regular file.
    fn exists(&self, path: &Path) -> bool;

    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Media files on the local disk, served elsewhere under `base_url`.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Extension of the suggested name if it is a plain alphanumeric token.
fn pick_extension(kind: MediaKind, suggested_name: &str) -> String {
    Path::new(suggested_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| kind.default_extension().to_string())
}

impl MediaStore for LocalMediaStore {
    fn save(&self, kind: MediaKind, bytes: &[u8], suggested_name: &str) -> AppResult<String> {
        let dir = self.root.join(kind.subdir());
        fs::create_dir_all(&dir)?;

        let name = format!(
            "{}_{}.{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            Uuid::new_v4().simple(),
            pick_extension(kind, suggested_name)
        );
        fs::write(dir.join(&name), bytes)?;

        Ok(format!("{}/{}/{}", self.base_url, kind.subdir(), name))
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, PathRejected> {
        resolve_media_path(&self.root, &self.base_url, url)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}
