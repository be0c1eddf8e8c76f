//! Path canonicalisation shared by every component that feeds paths back to
//! the build executor.
//!
//! Dependency paths are resolved to their real location (following symlinks),
//! rewritten relative to a root directory when they live beneath it, and
//! normalised to forward slashes. Ninja compares these strings against the
//! paths it tracks, so the capture runtime and the compiler resolver must
//! agree on them byte for byte.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::io;

/// Resolves dependency paths relative to a fixed root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonicalizer {
    root: Utf8PathBuf,
}

impl Canonicalizer {
    /// Create a canonicaliser rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] when `root` does not exist or its real path is
    /// not valid UTF-8.
    pub fn new(root: &Utf8Path) -> io::Result<Self> {
        let root = real_path(root)?;
        Ok(Self { root })
    }

    /// Create a canonicaliser rooted at the process working directory.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] when the working directory cannot be read.
    pub fn current_dir() -> io::Result<Self> {
        let cwd = std::env::current_dir()?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|path| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("working directory {} is not valid UTF-8", path.display()),
            )
        })?;
        Self::new(&cwd)
    }

    /// Real path of the root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Canonicalise `path`, resolving relative paths against the root.
    ///
    /// Symlinks are followed so the result names the file the executor will
    /// stat. Paths beneath the root come back relative; anything else stays
    /// absolute.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] when the path no longer exists.
    pub fn canonicalize(&self, path: &Utf8Path) -> io::Result<String> {
        let absolute = if path.is_relative() {
            self.root.join(path)
        } else {
            path.to_path_buf()
        };
        let real = real_path(&absolute)?;
        Ok(self.display(&real))
    }

    /// Render an already-real path relative to the root when possible.
    #[must_use]
    pub fn display(&self, real: &Utf8Path) -> String {
        let shown = match real.strip_prefix(&self.root) {
            Ok(relative) if !relative.as_str().is_empty() => relative,
            _ => real,
        };
        to_forward_slashes(shown.as_str())
    }
}

/// Replace backslash separators with forward slashes.
#[must_use]
pub fn to_forward_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

fn real_path(path: &Utf8Path) -> io::Result<Utf8PathBuf> {
    let real = path.canonicalize_utf8()?;
    Ok(strip_verbatim_prefix(real))
}

#[cfg(windows)]
fn strip_verbatim_prefix(path: Utf8PathBuf) -> Utf8PathBuf {
    match path.as_str().strip_prefix(r"\\?\") {
        Some(stripped) => Utf8PathBuf::from(stripped),
        None => path,
    }
}

#[cfg(not(windows))]
const fn strip_verbatim_prefix(path: Utf8PathBuf) -> Utf8PathBuf {
    path
}

/// Normalise `.` and `..` components without touching the filesystem.
///
/// Leading `..` components of a relative path are preserved.
#[must_use]
pub fn normalize_lexically(path: &Utf8Path) -> Utf8PathBuf {
    let mut parts: Vec<Utf8Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match parts.last() {
                Some(Utf8Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Utf8Component::RootDir | Utf8Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    let mut normalised = Utf8PathBuf::new();
    for part in parts {
        normalised.push(part.as_str());
    }
    normalised
}

/// Compute `path` relative to `base` lexically.
///
/// Both paths are normalised first. Returns `None` when one path is absolute
/// and the other is not.
#[must_use]
pub fn relative_lexically(path: &Utf8Path, base: &Utf8Path) -> Option<Utf8PathBuf> {
    let path = normalize_lexically(path);
    let base = normalize_lexically(base);
    if path.is_absolute() != base.is_absolute() {
        return None;
    }
    let path_parts: Vec<&str> = path.components().map(|c| c.as_str()).collect();
    let base_parts: Vec<&str> = base.components().map(|c| c.as_str()).collect();
    let shared = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();
    let mut relative = Utf8PathBuf::new();
    for _ in shared..base_parts.len() {
        relative.push("..");
    }
    for part in path_parts.iter().skip(shared) {
        relative.push(part);
    }
    Some(relative)
}
