//! Failures raised while resolving or running the TypeScript compiler.

// Derive expansion for `thiserror`/`miette` trips `unused_assignments` on some
// toolchains; `#[expect]` is unusable because the lint does not always fire.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use crate::depfile::DepfileError;
use camino::Utf8PathBuf;
use miette::Diagnostic;
use std::io;
use thiserror::Error;

/// Errors from the compiler dependency resolver.
#[derive(Debug, Error, Diagnostic)]
pub enum TscError {
    /// A compiler option holds a nested object.
    #[error("compiler option `{name}` must be a string, number, boolean, null or array")]
    #[diagnostic(
        code(shinobi::tsc::unsupported_option),
        help("set object-valued options in a tsconfig file and pass it with --project")
    )]
    UnsupportedOption {
        /// Option name.
        name: String,
    },

    /// Compiler options were not a JSON object.
    #[error("compiler options are not a JSON object")]
    #[diagnostic(code(shinobi::tsc::invalid_options))]
    InvalidOptions {
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },

    /// The compiler executable could not be started.
    #[error("failed to run {program}")]
    #[diagnostic(
        code(shinobi::tsc::spawn),
        help("install typescript or point SHINOBI_TSC at the compiler")
    )]
    Spawn {
        /// Executable that failed to start.
        program: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The compiler exited unsuccessfully.
    #[error("tsc failed{}", format_diagnostics(.diagnostics))]
    #[diagnostic(code(shinobi::tsc::compilation_failed))]
    CompilationFailed {
        /// Error lines reported by the compiler.
        diagnostics: Vec<String>,
    },

    /// `--showConfig` printed something other than a configuration.
    #[error("could not read the resolved configuration of {project}")]
    #[diagnostic(code(shinobi::tsc::show_config))]
    ShowConfig {
        /// Project file that was resolved.
        project: Utf8PathBuf,
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },

    /// The compiler's list of emitted files could not be parsed.
    #[error("could not read the emitted file names reported by {program}")]
    #[diagnostic(code(shinobi::tsc::emitted_files))]
    EmittedFiles {
        /// Executable that answered.
        program: Utf8PathBuf,
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },

    /// A listed file could not be canonicalised.
    #[error("failed to canonicalise compiler input {path}")]
    #[diagnostic(code(shinobi::tsc::canonicalize))]
    Canonicalize {
        /// Listed path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The typecheck stamp could not be updated.
    #[error("failed to touch {path}")]
    #[diagnostic(code(shinobi::tsc::stamp))]
    Stamp {
        /// Stamp file.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A dependency side file could not be written.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Depfile(#[from] DepfileError),
}

fn format_diagnostics(lines: &[String]) -> String {
    if lines.is_empty() {
        String::new()
    } else {
        format!(":\n{}", lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compilation_failure_lists_error_lines() {
        let err = TscError::CompilationFailed {
            diagnostics: vec!["a.ts(1,1): error TS2304: Cannot find name 'x'.".into()],
        };
        assert_eq!(
            err.to_string(),
            "tsc failed:\na.ts(1,1): error TS2304: Cannot find name 'x'."
        );
        let bare = TscError::CompilationFailed {
            diagnostics: Vec::new(),
        };
        assert_eq!(bare.to_string(), "tsc failed");
    }
}
