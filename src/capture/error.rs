//! Failures raised while capturing a script's dependencies.

// Derive expansion for `thiserror`/`miette` trips `unused_assignments` on some
// toolchains; `#[expect]` is unusable because the lint does not always fire.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use std::io;
use thiserror::Error;

/// Errors raised by [`crate::capture::CaptureContext`] and the module tracer.
#[derive(Debug, Error, Diagnostic)]
pub enum CaptureError {
    /// The dependency record could not be created.
    #[error("failed to open dependency record {path}")]
    #[diagnostic(code(shinobi::capture::open))]
    Open {
        /// Depfile being created.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Appending to the dependency record failed.
    #[error("failed to write dependency record {path}")]
    #[diagnostic(code(shinobi::capture::write))]
    Write {
        /// Depfile being written.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A dependency could not be canonicalised.
    #[error("dependency {path} could not be resolved to a real path")]
    #[diagnostic(
        code(shinobi::capture::canonicalize),
        help("the file may have been removed while the build was running")
    )]
    Canonicalize {
        /// Dependency as reported.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A module reached by the tracer could not be read.
    #[error("failed to read module {path}")]
    #[diagnostic(code(shinobi::capture::read_module))]
    ReadModule {
        /// Module being scanned.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The loader thread stopped before answering every request.
    #[error("module loader thread exited unexpectedly")]
    #[diagnostic(code(shinobi::capture::loader_disconnected))]
    LoaderDisconnected,
}
