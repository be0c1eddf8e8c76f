//! Execution-time half of the compiler dependency protocol.
//!
//! One compiler invocation lists every file it consulted. The list becomes
//! either a Make-style record next to the primary output, consulted after
//! the edge has run, or a dyndep file Ninja loads before scheduling the
//! compile edge.

use super::{Compiler, TscError, error_lines, listed_files};
use crate::canonical::Canonicalizer;
use crate::depfile::{DependencyRecord, DyndepEntry, DyndepFile};
use crate::file_io;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

/// What a run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Emit, then record the consulted files in `<out>.depfile`.
    Compile,
    /// Type-check only, touch the stamp `out`, then record `<out>.depfile`.
    Typecheck,
    /// List files without checking and write them to the dyndep file `out`
    /// as implicit inputs of `target`.
    Dyndep {
        /// Primary output of the compile edge that binds the dyndep file.
        target: String,
    },
}

impl Mode {
    fn flags(&self) -> &'static [&'static str] {
        match self {
            Self::Compile => &["--listFiles", "--pretty", "false"],
            Self::Typecheck => &["--noEmit", "--listFiles", "--pretty", "false"],
            Self::Dyndep { .. } => &["--listFilesOnly", "--pretty", "false"],
        }
    }
}

/// One scheduled compiler edge.
///
/// Paths are relative to the build directory, which is the canonicaliser's
/// root at execution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TscRun {
    /// What to produce.
    pub mode: Mode,
    /// The edge's `$out`.
    pub out: Utf8PathBuf,
    /// Directory the compiler runs in.
    pub cwd: Utf8PathBuf,
    /// Project file passed with `--project`.
    pub project: Option<Utf8PathBuf>,
    /// Entry points.
    pub inputs: Vec<Utf8PathBuf>,
    /// Compiler option arguments.
    pub args: Vec<String>,
}

impl TscRun {
    /// Build the compiler arguments, with every path made absolute under
    /// `root`.
    #[must_use]
    pub fn compiler_args(&self, root: &Utf8Path) -> Vec<String> {
        let mut args: Vec<String> = self.mode.flags().iter().map(|&flag| flag.to_owned()).collect();
        args.extend(self.args.iter().cloned());
        if let Some(project) = &self.project {
            args.push("--project".to_owned());
            args.push(root.join(project).into_string());
        }
        args.extend(self.inputs.iter().map(|input| root.join(input).into_string()));
        args
    }

    /// Run the compiler and write the side file for this mode.
    ///
    /// Returns the recorded dependencies, canonicalised against `canon`.
    ///
    /// # Errors
    ///
    /// Returns [`TscError::CompilationFailed`] with only the compiler's error
    /// lines when it exits unsuccessfully; nothing is written in that case.
    /// Listed files that cannot be canonicalised, an unwritable side file,
    /// or a failed stamp update are also errors.
    pub fn execute(
        &self,
        compiler: &dyn Compiler,
        canon: &Canonicalizer,
    ) -> Result<Vec<String>, TscError> {
        let root = canon.root();
        let output = compiler.invoke(&root.join(&self.cwd), &self.compiler_args(root))?;
        if !output.success {
            return Err(TscError::CompilationFailed {
                diagnostics: error_lines(&output.combined()),
            });
        }
        let dependencies = listed_files(&output.stdout)
            .into_iter()
            .map(|path| {
                canon
                    .canonicalize(path)
                    .map_err(|source| TscError::Canonicalize {
                        path: path.to_path_buf(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = dependencies.len(), "compiler listed dependencies");

        let out = root.join(&self.out);
        match &self.mode {
            Mode::Compile => self.write_record(&out, &dependencies)?,
            Mode::Typecheck => {
                file_io::touch(&out).map_err(|source| TscError::Stamp {
                    path: out.clone(),
                    source,
                })?;
                self.write_record(&out, &dependencies)?;
            }
            Mode::Dyndep { target } => {
                let mut entry = DyndepEntry::new(target.clone());
                entry.implicit_inputs.clone_from(&dependencies);
                DyndepFile::from(vec![entry]).write(&out)?;
                info!(path = %out, "wrote dyndep file");
            }
        }
        Ok(dependencies)
    }

    fn write_record(&self, out: &Utf8Path, dependencies: &[String]) -> Result<(), TscError> {
        let mut record = DependencyRecord::new(self.out.as_str());
        for dependency in dependencies {
            record.insert(dependency.as_str());
        }
        let path = Utf8PathBuf::from(format!("{out}.depfile"));
        record.write(&path)?;
        info!(path = %path, "wrote dependency record");
        Ok(())
    }
}
