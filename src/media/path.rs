//! Mapping stored media URLs back to files under the media root.
//!
//! Every path handed out by [`resolve_media_path`] is the media root itself or
//! lies below it. Anything else is a [`PathRejected`], which callers treat as
//! "no file" rather than as a failure.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathRejected {
    #[error("empty media url")]
    Empty,

    #[error("malformed media url '{0}'")]
    Malformed(String),

    #[error("absolute path override in media url '{0}'")]
    Absolute(String),

    #[error("media url '{0}' escapes the media root")]
    Escapes(String),
}

/// Strip `base` from the front of `url` only on a path boundary, so a base of
/// `http://h/media` does not swallow `http://h/media-old/...`.
fn strip_base<'a>(url: &'a str, base: &str) -> Option<&'a str> {
    if base.is_empty() {
        return None;
    }
    let rest = url.strip_prefix(base)?;
    if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') {
        Some(rest)
    } else {
        None
    }
}

fn strip_query_and_fragment(s: &str) -> &str {
    let end = s.find(['?', '#']).unwrap_or(s.len());
    &s[..end]
}

/// Path of the media file relative to the media root, before normalization.
fn relative_part(url: &str, base_url: &str) -> Result<String, PathRejected> {
    let base = base_url.trim().trim_end_matches('/');

    if let Some(rest) = strip_base(url, base) {
        return Ok(rest.trim_start_matches(['/', '\\']).to_string());
    }

    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(url::ParseError::RelativeUrlWithoutBase) => strip_query_and_fragment(url).to_string(),
        Err(e) => return Err(PathRejected::Malformed(format!("{} ({})", url, e))),
    };

    let trimmed = path.trim_start_matches(['/', '\\']);
    Ok(trimmed.strip_prefix("media/").unwrap_or(trimmed).to_string())
}

/// Resolve a stored media URL to an absolute path inside `root`.
pub fn resolve_media_path(root: &Path, base_url: &str, url: &str) -> Result<PathBuf, PathRejected> {
    let url = url.trim();
    if url.is_empty() {
        return Err(PathRejected::Empty);
    }
    if url.contains('\0') {
        return Err(PathRejected::Malformed(url.replace('\0', "\\0")));
    }

    let rel = relative_part(url, base_url)?;

    let root_abs = std::path::absolute(root)
        .map_err(|e| PathRejected::Malformed(format!("media root {}: {}", root.display(), e)))?;

    let mut parts: Vec<&OsStr> = Vec::new();
    for comp in Path::new(&rel).components() {
        match comp {
            Component::Normal(p) => parts.push(p),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(PathRejected::Escapes(url.to_string()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathRejected::Absolute(url.to_string()));
            }
        }
    }

    let mut resolved = root_abs.clone();
    resolved.extend(parts);

    if !resolved.starts_with(&root_abs) {
        return Err(PathRejected::Escapes(url.to_string()));
    }

    // A symlink under the root may still point elsewhere.
    if resolved.exists() {
        let canon_root = root_abs
            .canonicalize()
            .map_err(|_| PathRejected::Malformed(url.to_string()))?;
        let canon = resolved
            .canonicalize()
            .map_err(|_| PathRejected::Malformed(url.to_string()))?;
        if !canon.starts_with(&canon_root) {
            return Err(PathRejected::Escapes(url.to_string()));
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const BASE: &str = "http://127.0.0.1:5000/media";

    fn root() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn base_url_prefix_is_stripped() {
        let dir = root();
        let p = resolve_media_path(dir.path(), BASE, &format!("{}/screenshots/a.png", BASE)).unwrap();
        assert_eq!(p, std::path::absolute(dir.path()).unwrap().join("screenshots/a.png"));
    }

    #[test]
    fn foreign_host_falls_back_to_media_prefix() {
        let dir = root();
        let p = resolve_media_path(
            dir.path(),
            BASE,
            "https://cdn.example.com/media/recordings/r.mp4?sig=1",
        )
        .unwrap();
        assert!(p.ends_with("recordings/r.mp4"));
    }

    #[test]
    fn bare_media_path_is_accepted() {
        let dir = root();
        let p = resolve_media_path(dir.path(), BASE, "/media/screenshots/b.png").unwrap();
        assert!(p.ends_with("screenshots/b.png"));
        assert!(p.starts_with(std::path::absolute(dir.path()).unwrap()));
    }

    #[test]
    fn traversal_after_base_is_rejected() {
        let dir = root();
        let url = format!("{}/../secret.png", BASE);
        assert!(matches!(
            resolve_media_path(dir.path(), BASE, &url),
            Err(PathRejected::Escapes(_))
        ));
    }

    #[test]
    fn traversal_in_relative_path_is_rejected() {
        let dir = root();
        assert!(matches!(
            resolve_media_path(dir.path(), BASE, "/media/screenshots/../../../etc/passwd"),
            Err(PathRejected::Escapes(_))
        ));
    }

    #[test]
    fn inner_dotdot_that_stays_inside_is_fine() {
        let dir = root();
        let p = resolve_media_path(dir.path(), BASE, "/media/screenshots/../recordings/x.mp4").unwrap();
        assert!(p.ends_with("recordings/x.mp4"));
    }

    #[test]
    fn empty_and_nul_urls_are_rejected() {
        let dir = root();
        assert_eq!(resolve_media_path(dir.path(), BASE, "  "), Err(PathRejected::Empty));
        assert!(matches!(
            resolve_media_path(dir.path(), BASE, "/media/a\0.png"),
            Err(PathRejected::Malformed(_))
        ));
    }

    #[test]
    fn malformed_absolute_url_is_rejected() {
        let dir = root();
        assert!(matches!(
            resolve_media_path(dir.path(), BASE, "http://[::1/media/a.png"),
            Err(PathRejected::Malformed(_))
        ));
    }

    #[test]
    fn similar_base_prefix_is_not_stripped() {
        let dir = root();
        // `media-old` is not below the base url, so it is parsed as a plain url path.
        let p = resolve_media_path(dir.path(), BASE, "http://127.0.0.1:5000/media-old/a.png").unwrap();
        assert!(p.ends_with("media-old/a.png"));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_pointing_outside_is_rejected() {
        let outside = root();
        let dir = root();
        let target = outside.path().join("secret.png");
        fs::write(&target, b"x").unwrap();
        fs::create_dir_all(dir.path().join("screenshots")).unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("screenshots/link.png")).unwrap();

        assert!(matches!(
            resolve_media_path(dir.path(), BASE, "/media/screenshots/link.png"),
            Err(PathRejected::Escapes(_))
        ));
    }
}
