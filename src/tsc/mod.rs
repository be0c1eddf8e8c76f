//! TypeScript compiler dependency resolution.
//!
//! At graph-construction time [`declared_outputs`] and [`ProjectConfig`] ask
//! the compiler to name the files a compile edge produces, deriving them with
//! [`output_files`] when no compiler can answer. At execution time [`TscRun`]
//! invokes the compiler once, in a mode that lists every file it consulted,
//! and writes that list as a dependency record or a dyndep file.

mod config;
mod diagnostics;
mod driver;
mod error;
mod options;
mod outputs;
mod run;

pub use config::ProjectConfig;
pub use diagnostics::{error_lines, is_error_line, listed_files};
pub use driver::{
    Compiler, CompilerOutput, ProcessCompiler, resolve_node_program, resolve_tsc_program,
};
pub use error::TscError;
pub use options::CompilerOptions;
pub use outputs::{declared_outputs, output_files};
pub use run::{Mode, TscRun};
