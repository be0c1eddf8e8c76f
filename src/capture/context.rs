//! The open dependency record of one spawned script.

use super::CaptureError;
use crate::canonical::Canonicalizer;
use crate::depfile::DependencyRecord;
use crate::escape::escape_depfile_path;
use crate::file_io;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing::{debug, warn};

/// An open `<output>.depfile` and the paths recorded into it.
///
/// Exactly one context exists per captured process. It is created before any
/// hook can fire and both hooks record through a mutable borrow of it, so no
/// dependency can be reported before the record is open.
#[derive(Debug)]
pub struct CaptureContext {
    output: String,
    path: Utf8PathBuf,
    writer: BufWriter<File>,
    recorded: IndexSet<String>,
    canon: Canonicalizer,
}

impl CaptureContext {
    /// Open the record for `output`, relative to the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Open`] when the working directory cannot be
    /// resolved or the depfile cannot be created.
    pub fn open(output: &str) -> Result<Self, CaptureError> {
        let canon = Canonicalizer::current_dir().map_err(|source| CaptureError::Open {
            path: Utf8PathBuf::from(format!("{output}.depfile")),
            source,
        })?;
        Self::open_in(canon, output)
    }

    /// Open the record for `output`, resolving paths against `canon`'s root.
    ///
    /// Creates or truncates `<output>.depfile` and writes the `<output>:`
    /// prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Open`] when the depfile cannot be created.
    pub fn open_in(canon: Canonicalizer, output: &str) -> Result<Self, CaptureError> {
        let relative = Utf8PathBuf::from(format!("{output}.depfile"));
        let path = if relative.is_relative() {
            canon.root().join(&relative)
        } else {
            relative
        };
        let open_err = |source| CaptureError::Open {
            path: path.clone(),
            source,
        };
        file_io::ensure_parent_dir(&path).map_err(open_err)?;
        let file = File::create(&path).map_err(open_err)?;
        let mut writer = BufWriter::new(file);
        write!(writer, "{}:", escape_depfile_path(output)).map_err(open_err)?;
        debug!(depfile = %path, "opened dependency record");
        Ok(Self {
            output: output.to_owned(),
            path,
            writer,
            recorded: IndexSet::new(),
            canon,
        })
    }

    /// The output the record is keyed by.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Location of the depfile.
    #[must_use]
    pub fn depfile_path(&self) -> &Utf8Path {
        &self.path
    }

    /// Directory recorded dependencies are made relative to.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        self.canon.root()
    }

    /// Paths recorded so far, in discovery order.
    pub fn recorded(&self) -> impl Iterator<Item = &str> {
        self.recorded.iter().map(String::as_str)
    }

    /// Canonicalise `path` and append it to the record.
    ///
    /// Returns `false` when the path was already recorded.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Canonicalize`] when the path does not exist and
    /// [`CaptureError::Write`] when the depfile cannot be appended to.
    pub fn record_dependency(&mut self, path: &Utf8Path) -> Result<bool, CaptureError> {
        let canonical = self
            .canon
            .canonicalize(path)
            .map_err(|source| CaptureError::Canonicalize {
                path: path.to_path_buf(),
                source,
            })?;
        if self.recorded.contains(&canonical) {
            return Ok(false);
        }
        write!(self.writer, " {}", escape_depfile_path(&canonical)).map_err(|source| {
            CaptureError::Write {
                path: self.path.clone(),
                source,
            }
        })?;
        debug!(dependency = %canonical, "recorded dependency");
        self.recorded.insert(canonical);
        Ok(true)
    }

    /// Record a dependency the module system cannot see, such as a data file
    /// read by the script.
    ///
    /// # Errors
    ///
    /// As for [`Self::record_dependency`].
    pub fn add_dependency(&mut self, path: &Utf8Path) -> Result<bool, CaptureError> {
        self.record_dependency(path)
    }

    /// Record a path discovered through module resolution.
    ///
    /// A target that vanished between resolution and canonicalisation is
    /// skipped rather than failing the script.
    pub(crate) fn record_discovered(&mut self, path: &Utf8Path) -> Result<bool, CaptureError> {
        match self.record_dependency(path) {
            Err(CaptureError::Canonicalize { source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                warn!(path = %path, "dependency vanished before it could be recorded");
                Ok(false)
            }
            other => other,
        }
    }

    /// Terminate the line, flush the depfile and return what was recorded.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Write`] when the final flush fails.
    pub fn finish(mut self) -> Result<DependencyRecord, CaptureError> {
        let write_err = |source| CaptureError::Write {
            path: self.path.clone(),
            source,
        };
        writeln!(self.writer).map_err(write_err)?;
        self.writer.flush().map_err(write_err)?;
        let mut record = DependencyRecord::new(self.output);
        for dependency in self.recorded {
            record.insert(dependency);
        }
        Ok(record)
    }

    /// Close and delete the depfile so a failed run leaves nothing behind.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Write`] when the file cannot be removed.
    pub fn abandon(self) -> Result<(), CaptureError> {
        let Self { path, writer, .. } = self;
        drop(writer);
        file_io::remove_if_exists(&path).map_err(|source| CaptureError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(depfile = %path, "removed dependency record");
        Ok(())
    }
}
