//! Failures raised by the rule factories.

// Derive expansion for `thiserror`/`miette` trips `unused_assignments` on some
// toolchains; `#[expect]` is unusable because the lint does not always fire.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use crate::ninja::GraphError;
use crate::tsc::TscError;
use miette::Diagnostic;
use thiserror::Error;

/// Errors from building an edge through a rule factory.
#[derive(Debug, Error, Diagnostic)]
pub enum RuleError {
    /// The edge broke its rule's schema.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    /// The compiler options or project could not be resolved.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tsc(#[from] TscError),

    /// The compiler would emit nothing for these inputs.
    #[error("tsc emits no files for {inputs}")]
    #[diagnostic(
        code(shinobi::rules::no_outputs),
        help("set outDir for JavaScript inputs, or drop noEmit")
    )]
    NoOutputs {
        /// The inputs, space separated.
        inputs: String,
    },
}
