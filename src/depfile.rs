//! Side files read by the build executor after graph construction.
//!
//! A [`DependencyRecord`] is a Make-style `output: dep dep` line consulted
//! after the edge has run once. A [`DyndepFile`] declares extra inputs and
//! outputs that Ninja loads before scheduling the edge that binds it.

// Derive expansion for `thiserror`/`miette` on `DepfileError` trips
// `unused_assignments` on some toolchains; `#[expect]` is unusable because the
// lint does not always fire.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use crate::escape::{escape_depfile_path, join_escaped};
use crate::file_io;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use itertools::Itertools;
use miette::Diagnostic;
use std::fmt::{self, Display, Formatter};
use std::io;
use thiserror::Error;

/// Failures reading or writing dependency side files.
#[derive(Debug, Error, Diagnostic)]
pub enum DepfileError {
    /// The file could not be read or written.
    #[error("failed to access dependency file {path}")]
    #[diagnostic(code(shinobi::depfile::io))]
    Io {
        /// File being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The file has no `output:` separator.
    #[error("dependency file {path} has no `<output>:` prefix")]
    #[diagnostic(code(shinobi::depfile::malformed))]
    Malformed {
        /// File being parsed.
        path: Utf8PathBuf,
    },
}

/// One output and the set of files it was discovered to depend on.
///
/// # Examples
///
/// ```
/// use shinobi::depfile::DependencyRecord;
///
/// let mut record = DependencyRecord::new("dist/out.txt");
/// record.insert("src/a b.js");
/// record.insert("src/c.js");
/// record.insert("src/c.js");
/// assert_eq!(record.to_string(), "dist/out.txt: src/a\\ b.js src/c.js\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    output: String,
    inputs: IndexSet<String>,
}

impl DependencyRecord {
    /// Start an empty record for `output`.
    #[must_use]
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            inputs: IndexSet::new(),
        }
    }

    /// The output the record is keyed by.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Discovered inputs in discovery order.
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(String::as_str)
    }

    /// Record `input`; returns `false` when it was already present.
    pub fn insert(&mut self, input: impl Into<String>) -> bool {
        self.inputs.insert(input.into())
    }

    /// Parse the text of a depfile.
    ///
    /// Backslash-escaped spaces and `\` line continuations are understood.
    /// Returns `None` when the text has no unescaped `:` separator.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let joined = text.replace("\\\r\n", " ").replace("\\\n", " ");
        let mut tokens = split_depfile_tokens(&joined).into_iter();
        let first = tokens.next()?;
        let output = first.strip_suffix(':')?.to_owned();
        let mut record = Self::new(output);
        for token in tokens {
            record.insert(token);
        }
        Some(record)
    }

    /// Read and parse the depfile at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DepfileError`] when the file cannot be read or lacks an
    /// output prefix.
    pub fn read(path: &Utf8Path) -> Result<Self, DepfileError> {
        let text = std::fs::read_to_string(path).map_err(|source| DepfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).ok_or_else(|| DepfileError::Malformed {
            path: path.to_path_buf(),
        })
    }

    /// Atomically write the record to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DepfileError::Io`] when the file cannot be written.
    pub fn write(&self, path: &Utf8Path) -> Result<(), DepfileError> {
        file_io::write_atomic(path, &self.to_string()).map_err(|source| DepfileError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Display for DependencyRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", escape_depfile_path(&self.output))?;
        for input in &self.inputs {
            write!(f, " {}", escape_depfile_path(input))?;
        }
        writeln!(f)
    }
}

fn split_depfile_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&' ') => {
                current.push(' ');
                chars.next();
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Extra inputs and outputs declared for one edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DyndepEntry {
    /// Explicit outputs identifying the edge.
    pub outputs: Vec<String>,
    /// Outputs discovered at run time.
    pub implicit_outputs: Vec<String>,
    /// Inputs discovered at run time.
    pub implicit_inputs: Vec<String>,
    /// Ask the executor to re-stat outputs after the edge runs.
    pub restat: bool,
}

impl DyndepEntry {
    /// Start an entry for the edge producing `output`.
    #[must_use]
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            outputs: vec![output.into()],
            ..Self::default()
        }
    }
}

/// A complete `ninja_dyndep_version = 1` file.
///
/// # Examples
///
/// ```
/// use shinobi::depfile::{DyndepEntry, DyndepFile};
///
/// let mut entry = DyndepEntry::new("dist/index.js");
/// entry.implicit_inputs = vec!["src/index.ts".into(), "src/util.ts".into()];
/// let file = DyndepFile::from(vec![entry]);
/// assert_eq!(
///     file.to_string(),
///     "ninja_dyndep_version = 1\nbuild dist/index.js : dyndep | src/index.ts src/util.ts\n"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DyndepFile {
    entries: Vec<DyndepEntry>,
}

impl DyndepFile {
    /// Append an entry.
    pub fn push(&mut self, entry: DyndepEntry) {
        self.entries.push(entry);
    }

    /// Entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[DyndepEntry] {
        &self.entries
    }

    /// Atomically write the file to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DepfileError::Io`] when the file cannot be written.
    pub fn write(&self, path: &Utf8Path) -> Result<(), DepfileError> {
        file_io::write_atomic(path, &self.to_string()).map_err(|source| DepfileError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl From<Vec<DyndepEntry>> for DyndepFile {
    fn from(entries: Vec<DyndepEntry>) -> Self {
        Self { entries }
    }
}

impl Display for DyndepFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "ninja_dyndep_version = 1")?;
        for entry in &self.entries {
            write!(f, "build {}", join_escaped(&entry.outputs))?;
            if !entry.implicit_outputs.is_empty() {
                write!(f, " | {}", join_escaped(&entry.implicit_outputs))?;
            }
            write!(f, " : dyndep")?;
            if !entry.implicit_inputs.is_empty() {
                write!(f, " | {}", join_escaped(&entry.implicit_inputs))?;
            }
            writeln!(f)?;
            if entry.restat {
                writeln!(f, "  restat = 1")?;
            }
        }
        Ok(())
    }
}

/// Render sorted inputs for diagnostics and test expectations.
#[must_use]
pub fn sorted_inputs(record: &DependencyRecord) -> Vec<String> {
    record.inputs().map(str::to_owned).sorted().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};
    use rstest::rstest;

    #[rstest]
    #[case("out.txt: a.js b.js\n", "out.txt", &["a.js", "b.js"])]
    #[case("out.txt:\n", "out.txt", &[])]
    #[case("out.txt: my\\ file.js \\\n  other.js", "out.txt", &["my file.js", "other.js"])]
    #[case("dir\\ x/out: a", "dir x/out", &["a"])]
    fn parses_depfiles(#[case] text: &str, #[case] output: &str, #[case] inputs: &[&str]) {
        let record = DependencyRecord::parse(text).expect("valid depfile");
        assert_eq!(record.output(), output);
        assert_eq!(record.inputs().collect::<Vec<_>>(), inputs);
    }

    #[test]
    fn rejects_text_without_separator() {
        assert!(DependencyRecord::parse("just words").is_none());
        assert!(DependencyRecord::parse("").is_none());
    }

    #[test]
    fn record_dedupes_and_escapes() {
        let mut record = DependencyRecord::new("out dir/x");
        assert!(record.insert("a b"));
        assert!(!record.insert("a b"));
        assert_eq!(record.to_string(), "out\\ dir/x: a\\ b\n");
        let reparsed = DependencyRecord::parse(&record.to_string()).expect("reparse");
        assert_eq!(reparsed, record);
    }

    #[test]
    fn dyndep_escapes_ninja_paths_and_restat() {
        let file = DyndepFile::from(vec![DyndepEntry {
            outputs: vec!["dist/a b.js".into()],
            implicit_outputs: vec!["dist/a b.d.ts".into()],
            implicit_inputs: vec!["C:/src/a.ts".into()],
            restat: true,
        }]);
        assert_eq!(
            file.to_string(),
            "ninja_dyndep_version = 1\nbuild dist/a$ b.js | dist/a$ b.d.ts : dyndep | C$:/src/a.ts\n  restat = 1\n"
        );
    }

    #[test]
    fn write_and_read_round_trip() -> Result<()> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = Utf8Path::from_path(temp.path()).context("utf8 temp dir")?;
        let path = root.join("out.txt.depfile");
        let mut record = DependencyRecord::new("out.txt");
        record.insert("b.js");
        record.insert("a.js");
        record.write(&path)?;
        let read = DependencyRecord::read(&path)?;
        assert_eq!(sorted_inputs(&read), vec!["a.js", "b.js"]);
        Ok(())
    }

    #[test]
    fn read_failures_carry_diagnostic_codes() -> Result<()> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = Utf8Path::from_path(temp.path()).context("utf8 temp dir")?;
        let missing = DependencyRecord::read(&root.join("absent.depfile")).expect_err("missing");
        assert!(matches!(missing, DepfileError::Io { .. }));
        assert_eq!(
            missing.code().map(|code| code.to_string()).as_deref(),
            Some("shinobi::depfile::io")
        );

        let path = root.join("garbled.depfile");
        std::fs::write(&path, "no separator here").context("write garbled depfile")?;
        let garbled = DependencyRecord::read(&path).expect_err("malformed");
        assert!(matches!(garbled, DepfileError::Malformed { .. }));
        assert!(garbled.to_string().contains("garbled.depfile"));
        Ok(())
    }
}
