//! Configuration errors raised while constructing a build graph.

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

/// Errors raised synchronously by [`crate::ninja::NinjaBuilder`].
///
/// A failing call appends nothing to the builder's buffer.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// The rule schema does not mark `out` as required.
    #[error("rule `{rule}` must declare `out` as a required variable")]
    #[diagnostic(code(shinobi::graph::output_not_required))]
    OutputNotRequired {
        /// Name of the offending rule.
        rule: String,
    },

    /// The rule schema gives `in` a default instead of requiring it.
    #[error("rule `{rule}` gives `in` a default; inputs must be declared as required")]
    #[diagnostic(code(shinobi::graph::input_not_required))]
    InputNotRequired {
        /// Name of the offending rule.
        rule: String,
    },

    /// A schema entry is both required and defaulted.
    #[error("rule `{rule}` lists `{name}` as both required and defaulted")]
    #[diagnostic(code(shinobi::graph::conflicting_schema))]
    ConflictingSchema {
        /// Name of the offending rule.
        rule: String,
        /// Variable declared twice.
        name: String,
    },

    /// A reserved rule-level variable was marked as a required edge variable.
    #[error("rule `{rule}` cannot require reserved variable `{name}` on its edges")]
    #[diagnostic(code(shinobi::graph::reserved_requirement))]
    ReservedRequirement {
        /// Name of the offending rule.
        rule: String,
        /// Reserved variable name.
        name: String,
    },

    /// An edge omitted a variable its rule requires.
    #[error("`{rule}` edge is missing required variable `{name}`")]
    #[diagnostic(
        code(shinobi::graph::missing_required),
        help("supply `{name}` in the edge's variables")
    )]
    MissingRequired {
        /// Rule the edge instantiates.
        rule: String,
        /// Missing variable name.
        name: String,
    },

    /// An edge's variable bag used a reserved name.
    #[error("`{rule}` edge variable `{name}` collides with a reserved Ninja variable")]
    #[diagnostic(
        code(shinobi::graph::reserved_variable),
        help("use the dedicated build argument for outputs, inputs, `dyndep`, or `pool`")
    )]
    ReservedVariable {
        /// Rule the edge instantiates.
        rule: String,
        /// Colliding variable name.
        name: String,
    },

    /// An `Arity::One` slot received a different number of paths.
    #[error("`{rule}` expects exactly one `{slot}` path but the edge supplied {count}")]
    #[diagnostic(code(shinobi::graph::arity_mismatch))]
    ArityMismatch {
        /// Rule the edge instantiates.
        rule: String,
        /// Either `out` or `in`.
        slot: &'static str,
        /// Number of paths supplied.
        count: usize,
    },

    /// An edge supplied inputs to a rule that declares none.
    #[error("`{rule}` declares no `in` but the edge supplied {count} input(s)")]
    #[diagnostic(code(shinobi::graph::unexpected_inputs))]
    UnexpectedInputs {
        /// Rule the edge instantiates.
        rule: String,
        /// Number of inputs supplied.
        count: usize,
    },

    /// An edge declared no outputs.
    #[error("`{rule}` edge declares no outputs")]
    #[diagnostic(code(shinobi::graph::no_outputs))]
    NoOutputs {
        /// Rule the edge instantiates.
        rule: String,
    },

    /// A pool was declared with a depth of zero.
    #[error("pool `{name}` must have a positive depth")]
    #[diagnostic(code(shinobi::graph::invalid_pool_depth))]
    InvalidPoolDepth {
        /// Pool name.
        name: String,
    },

    /// The finished graph could not be written.
    #[error("failed to write build graph to {path}")]
    #[diagnostic(code(shinobi::graph::write))]
    Write {
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}
