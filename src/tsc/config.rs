//! Project configuration as the compiler resolves it.
//!
//! `include`, `exclude` and `extends` are evaluated by `tsc --showConfig`
//! rather than here; its JSON names the concrete `files` and the merged
//! `compilerOptions`.

use super::outputs::ask_compiler;
use super::{Compiler, CompilerOptions, TscError, error_lines, output_files};
use crate::canonical::normalize_lexically;
use crate::file_io;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShownConfig {
    #[serde(default)]
    compiler_options: CompilerOptions,
    #[serde(default)]
    files: Vec<String>,
}

/// The inputs and options of one `tsconfig.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    dir: Utf8PathBuf,
    file_name: String,
    overrides: CompilerOptions,
    files: Vec<String>,
    options: CompilerOptions,
}

impl ProjectConfig {
    /// Ask `compiler` for the configuration of `project`, with `overrides`
    /// applied on top.
    ///
    /// `project` is relative to the build directory; the returned files are
    /// too.
    ///
    /// # Errors
    ///
    /// Returns [`TscError::CompilationFailed`] when the compiler rejects the
    /// project, [`TscError::ShowConfig`] when its answer cannot be parsed,
    /// and any error raised invoking the compiler.
    pub fn resolve(
        compiler: &dyn Compiler,
        project: &Utf8Path,
        overrides: &CompilerOptions,
    ) -> Result<Self, TscError> {
        let dir = file_io::parent_dir(project).to_path_buf();
        let file_name = project.file_name().unwrap_or("tsconfig.json");
        let mut args = vec![
            "--showConfig".to_owned(),
            "--project".to_owned(),
            file_name.to_owned(),
        ];
        args.extend(overrides.to_args()?);
        let output = compiler.invoke(&dir, &args)?;
        if !output.success {
            return Err(TscError::CompilationFailed {
                diagnostics: error_lines(&output.combined()),
            });
        }
        let shown: ShownConfig =
            serde_json::from_str(&output.stdout).map_err(|source| TscError::ShowConfig {
                project: project.to_path_buf(),
                source,
            })?;
        let mut options = shown.compiler_options;
        options.merge(overrides);
        let files = shown
            .files
            .iter()
            .map(|file| normalize_lexically(&dir.join(file)).into_string())
            .collect();
        debug!(project = %project, "resolved project configuration");
        Ok(Self {
            file_name: file_name.to_owned(),
            overrides: overrides.clone(),
            ..Self::from_parts(dir, files, options)
        })
    }

    /// Assemble a configuration whose files are relative to the build
    /// directory and whose options are relative to `dir`.
    #[must_use]
    pub fn from_parts(dir: Utf8PathBuf, files: Vec<String>, options: CompilerOptions) -> Self {
        Self {
            dir: normalize_lexically(&dir),
            file_name: "tsconfig.json".to_owned(),
            overrides: CompilerOptions::new(),
            files,
            options,
        }
    }

    /// Directory holding the configuration file.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Files the project compiles.
    #[must_use]
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Effective compiler options.
    #[must_use]
    pub const fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Files the project emits as the compiler names them, relative to the
    /// build directory.
    ///
    /// Falls back to [`Self::outputs`] when `compiler` cannot answer.
    ///
    /// # Errors
    ///
    /// Returns any error `compiler` raises naming the outputs.
    pub fn declared_outputs(&self, compiler: &dyn Compiler) -> Result<Vec<String>, TscError> {
        if self.options.flag("noEmit") {
            return Ok(Vec::new());
        }
        let mut args = vec!["--project".to_owned(), self.file_name.clone()];
        args.extend(self.overrides.to_args()?);
        ask_compiler(compiler, &self.dir, &args, || self.outputs())
    }

    /// Files the project emits, derived from its files and options.
    #[must_use]
    pub fn outputs(&self) -> Vec<String> {
        output_files(&self.files, &self.options, &self.dir)
    }
}
