//! Error types for the runner module.
//!
//! This submodule isolates derive-macro-affected code to scope lint
//! suppressions narrowly.

// The `unused_assignments` lint fires on thiserror/miette derive expansion in
// some Rust versions but not others, so `#[expect]` cannot be used here.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors raised while running a captured program.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// A program was required but none followed `--`.
    #[error("no program given after `--`")]
    #[diagnostic(
        code(shinobi::runner::missing_program),
        help("append `-- <program> [args...]` to the capture command")
    )]
    MissingProgram,

    /// The program could not be started.
    #[error("failed to start {program}")]
    #[diagnostic(code(shinobi::runner::spawn))]
    Spawn {
        /// Program name as given on the command line.
        program: String,
        /// Underlying spawn failure.
        #[source]
        source: io::Error,
    },

    /// The program's output could not be forwarded.
    #[error("failed to forward output of {program}")]
    #[diagnostic(code(shinobi::runner::forward))]
    Forward {
        /// Program name as given on the command line.
        program: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// `--stdout` target could not be written.
    #[error("failed to write program output to {path}")]
    #[diagnostic(code(shinobi::runner::stdout_target))]
    StdoutTarget {
        /// File named by `--out`.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The program exited unsuccessfully.
    #[error("{program} exited with {status}")]
    #[diagnostic(
        code(shinobi::runner::program_failed),
        help("the partial dependency record was removed")
    )]
    ProgramFailed {
        /// Program name as given on the command line.
        program: String,
        /// Exit status reported by the operating system.
        status: ExitStatus,
    },
}
