//! File creation helpers shared by the graph writer and the dependency
//! runtimes.
//!
//! Generated files are written to a temporary sibling and renamed into place
//! so the build executor never reads a half-written graph, depfile, or dyndep
//! file.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use std::io::{self, Write};
use tempfile::NamedTempFile;
use tracing::debug;

/// Directory that holds `path`, treating a bare file name as `.`.
pub(crate) fn parent_dir(path: &Utf8Path) -> &Utf8Path {
    path.parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."))
}

/// Create every missing directory above `path`.
///
/// # Errors
///
/// Returns an [`io::Error`] when a directory cannot be created.
pub(crate) fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let parent = parent_dir(path);
    if parent == Utf8Path::new(".") {
        return Ok(());
    }
    if parent.is_relative() {
        let dir = Dir::open_ambient_dir(".", ambient_authority())?;
        dir.create_dir_all(parent)
    } else {
        std::fs::create_dir_all(parent)
    }
}

/// Atomically replace `path` with `content`.
///
/// # Errors
///
/// Returns an [`io::Error`] when the temporary file cannot be created,
/// written, synced, or renamed over `path`.
pub(crate) fn write_atomic(path: &Utf8Path, content: &str) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
    {
        let handle = tmp.as_file_mut();
        handle.write_all(content.as_bytes())?;
        handle.flush()?;
        handle.sync_all()?;
    }
    tmp.persist(path).map_err(|err| err.error)?;
    debug!(path = %path, bytes = content.len(), "wrote file");
    Ok(())
}

/// Create `path` as an empty file, truncating existing content.
///
/// Used for stamp outputs whose modification time is the only signal the
/// executor needs.
///
/// # Errors
///
/// Returns an [`io::Error`] when the file cannot be created.
pub(crate) fn touch(path: &Utf8Path) -> io::Result<()> {
    ensure_parent_dir(path)?;
    std::fs::File::create(path)?;
    Ok(())
}

/// Remove `path`, treating an already missing file as success.
///
/// # Errors
///
/// Returns an [`io::Error`] for any failure other than the file being absent.
pub(crate) fn remove_if_exists(path: &Utf8Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result, ensure};
    use camino::Utf8PathBuf;
    use rstest::rstest;

    fn temp_root() -> Result<(tempfile::TempDir, Utf8PathBuf)> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .map_err(|path| anyhow::anyhow!("non-UTF-8 temp dir {}", path.display()))?;
        Ok((temp, root))
    }

    #[rstest]
    #[case("build.ninja", ".")]
    #[case("out/build.ninja", "out")]
    #[case("/abs/build.ninja", "/abs")]
    fn parent_dir_defaults_to_current(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(parent_dir(Utf8Path::new(path)), Utf8Path::new(expected));
    }

    #[test]
    fn write_atomic_creates_parent_directories() -> Result<()> {
        let (_temp, root) = temp_root()?;
        let nested = root.join("nested/deeper/build.ninja");
        write_atomic(&nested, "build all: phony\n")?;
        let written = std::fs::read_to_string(&nested).context("read nested file")?;
        ensure!(written == "build all: phony\n", "unexpected contents {written:?}");
        Ok(())
    }

    #[test]
    fn write_atomic_replaces_existing_content() -> Result<()> {
        let (_temp, root) = temp_root()?;
        let file = root.join("out.d");
        write_atomic(&file, "first contents that are long")?;
        write_atomic(&file, "second")?;
        let written = std::fs::read_to_string(&file).context("read file")?;
        ensure!(written == "second", "stale bytes survived: {written:?}");
        Ok(())
    }

    #[test]
    fn touch_truncates_and_remove_tolerates_missing() -> Result<()> {
        let (_temp, root) = temp_root()?;
        let stamp = root.join("stamps/typecheck.stamp");
        touch(&stamp)?;
        ensure!(stamp.exists(), "stamp should exist");
        remove_if_exists(&stamp)?;
        remove_if_exists(&stamp)?;
        ensure!(!stamp.exists(), "stamp should be gone");
        Ok(())
    }
}
