//! Temporary directory trees populated from `(path, contents)` pairs.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// Write each `(relative path, contents)` pair under `root`, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns an error when a directory or file cannot be written.
pub fn write_files(root: &Utf8Path, files: &[(&str, &str)]) -> Result<()> {
    for (path, contents) in files {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        fs::write(&full, contents).with_context(|| format!("write {full}"))?;
    }
    Ok(())
}

/// A temporary directory whose root is canonical UTF-8.
///
/// Canonicalising the root up front keeps comparisons stable on platforms
/// where the temporary directory sits behind a symlink.
#[derive(Debug)]
pub struct Fixture {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Fixture {
    /// Create an empty tree.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or its path is
    /// not UTF-8.
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().context("create temp dir")?;
        let canonical = fs::canonicalize(dir.path()).context("canonicalise temp dir")?;
        let root = Utf8PathBuf::from_path_buf(canonical)
            .map_err(|path| anyhow::anyhow!("temp dir {} is not UTF-8", path.display()))?;
        Ok(Self { _dir: dir, root })
    }

    /// Create a tree holding `files`.
    ///
    /// # Errors
    ///
    /// As for [`Fixture::new`] and [`write_files`].
    pub fn with_files(files: &[(&str, &str)]) -> Result<Self> {
        let fixture = Self::new()?;
        write_files(&fixture.root, files)?;
        Ok(fixture)
    }

    /// Root of the tree.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Absolute path of `relative` inside the tree.
    pub fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    /// Read a file inside the tree.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read.
    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.path(relative);
        fs::read_to_string(&path).with_context(|| format!("read {path}"))
    }
}
