//! The files `tsc` writes for a set of inputs.
//!
//! [`declared_outputs`] asks the compiler through [`Compiler::emitted_files`],
//! so the names come from the `typescript` package's own emit logic. When no
//! compiler can answer, [`output_files`] derives them: inputs are rebased from
//! the common source directory (or `rootDir`) into `outDir`/`declarationDir`,
//! and the extension mapping depends on the module flavour of each source.
//! Either way results are prefixed with the working directory the compiler
//! runs in, so they are relative to the build directory like every other path
//! in the graph.

use super::{Compiler, CompilerOptions, TscError};
use crate::canonical::{normalize_lexically, relative_lexically, to_forward_slashes};
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use tracing::debug;

const DECLARATION_SUFFIXES: &[&str] = &[".d.ts", ".d.mts", ".d.cts"];

/// Files compiling `inputs` from `cwd` emits, as the compiler names them.
///
/// Falls back to [`output_files`] when `compiler` cannot answer.
///
/// # Errors
///
/// Returns [`TscError::UnsupportedOption`] when an option cannot be passed on
/// the command line, and any error `compiler` raises naming the outputs.
pub fn declared_outputs<S: AsRef<str>>(
    compiler: &dyn Compiler,
    inputs: &[S],
    options: &CompilerOptions,
    cwd: &Utf8Path,
) -> Result<Vec<String>, TscError> {
    if options.flag("noEmit") {
        return Ok(Vec::new());
    }
    let mut args: Vec<String> = inputs
        .iter()
        .map(|input| rebase(Utf8Path::new(input.as_ref()), cwd).into_string())
        .collect();
    args.extend(options.to_args()?);
    ask_compiler(compiler, cwd, &args, || output_files(inputs, options, cwd))
}

/// Run `args` past the compiler's naming query, deriving the names with
/// `derive` when it has no answer.
pub(super) fn ask_compiler(
    compiler: &dyn Compiler,
    cwd: &Utf8Path,
    args: &[String],
    derive: impl FnOnce() -> Vec<String>,
) -> Result<Vec<String>, TscError> {
    if let Some(files) = compiler.emitted_files(cwd, args)? {
        return Ok(files.iter().map(|file| prefix_with(cwd, file)).collect());
    }
    debug!(cwd = %cwd, "compiler cannot name its outputs; deriving them");
    Ok(derive())
}

/// Derive the emitted files for `inputs` compiled from `cwd`.
///
/// `inputs` are relative to the build directory, or absolute. The list holds,
/// per input and in order: the JavaScript output (or the copy of a JSON
/// module), its source map, the declaration file and its map, each only when
/// the options ask for it. The same inputs and options always give the same
/// list. Prefer [`declared_outputs`], which defers to the compiler.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use shinobi::tsc::{CompilerOptions, output_files};
///
/// let options = CompilerOptions::new().with("outDir", "dist").with("rootDir", ".");
/// let outputs = output_files(&["package/src/index.cts"], &options, Utf8Path::new("package"));
/// assert_eq!(outputs, ["package/dist/src/index.cjs"]);
/// ```
#[must_use]
pub fn output_files<S: AsRef<str>>(
    inputs: &[S],
    options: &CompilerOptions,
    cwd: &Utf8Path,
) -> Vec<String> {
    if options.flag("noEmit") {
        return Vec::new();
    }
    let sources: Vec<Utf8PathBuf> = inputs
        .iter()
        .map(|input| rebase(Utf8Path::new(input.as_ref()), cwd))
        .filter(|source| !is_declaration(source))
        .collect();
    let common = options.path("rootDir").map_or_else(
        || common_directory(&sources),
        |root| normalize_lexically(Utf8Path::new(root)),
    );
    let out_dir = options.path("outDir").map(Utf8Path::new);
    let declaration_dir = options.path("declarationDir").map(Utf8Path::new).or(out_dir);
    let emits_declarations = options.flag("declaration") || options.flag("composite");
    let preserve_jsx = options.get("jsx").and_then(Value::as_str) == Some("preserve");

    let mut outputs = Vec::new();
    for source in &sources {
        if source.extension() == Some("json") {
            // JSON modules are copied into an outDir, and never declared.
            if out_dir.is_some() && !options.flag("emitDeclarationOnly") {
                outputs.push(emitted_path(source, &common, out_dir, "json"));
            }
            continue;
        }
        let Some(kind) = SourceKind::of(source) else {
            continue;
        };
        // JavaScript sources would overwrite themselves without an outDir.
        let emits_javascript = !kind.is_javascript() || out_dir.is_some();
        if emits_javascript && !options.flag("emitDeclarationOnly") {
            let js = emitted_path(source, &common, out_dir, kind.js_extension(preserve_jsx));
            let map = options.flag("sourceMap").then(|| format!("{js}.map"));
            outputs.push(js);
            outputs.extend(map);
        }
        if emits_declarations {
            let dts = emitted_path(source, &common, declaration_dir, kind.declaration_extension());
            let map = options.flag("declarationMap").then(|| format!("{dts}.map"));
            outputs.push(dts);
            outputs.extend(map);
        }
    }
    outputs
        .into_iter()
        .map(|output| prefix_with(cwd, &output))
        .collect()
}

/// Module flavour of a compiler input, taken from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Ts,
    Tsx,
    Mts,
    Cts,
    Js,
    Jsx,
    Mjs,
    Cjs,
}

impl SourceKind {
    fn of(path: &Utf8Path) -> Option<Self> {
        Some(match path.extension()? {
            "ts" => Self::Ts,
            "tsx" => Self::Tsx,
            "mts" => Self::Mts,
            "cts" => Self::Cts,
            "js" => Self::Js,
            "jsx" => Self::Jsx,
            "mjs" => Self::Mjs,
            "cjs" => Self::Cjs,
            _ => return None,
        })
    }

    const fn is_javascript(self) -> bool {
        matches!(self, Self::Js | Self::Jsx | Self::Mjs | Self::Cjs)
    }

    const fn js_extension(self, preserve_jsx: bool) -> &'static str {
        match self {
            Self::Tsx | Self::Jsx if preserve_jsx => "jsx",
            Self::Ts | Self::Tsx | Self::Js | Self::Jsx => "js",
            Self::Mts | Self::Mjs => "mjs",
            Self::Cts | Self::Cjs => "cjs",
        }
    }

    const fn declaration_extension(self) -> &'static str {
        match self {
            Self::Ts | Self::Tsx | Self::Js | Self::Jsx => "d.ts",
            Self::Mts | Self::Mjs => "d.mts",
            Self::Cts | Self::Cjs => "d.cts",
        }
    }
}

fn is_declaration(path: &Utf8Path) -> bool {
    DECLARATION_SUFFIXES
        .iter()
        .any(|suffix| path.as_str().ends_with(suffix))
}

/// Express a build-directory input relative to the compiler's `cwd`.
fn rebase(input: &Utf8Path, cwd: &Utf8Path) -> Utf8PathBuf {
    if input.is_absolute() {
        return normalize_lexically(input);
    }
    relative_lexically(input, cwd).unwrap_or_else(|| normalize_lexically(input))
}

/// Longest directory shared by every source.
fn common_directory(sources: &[Utf8PathBuf]) -> Utf8PathBuf {
    let mut dirs = sources
        .iter()
        .map(|source| source.parent().unwrap_or_else(|| Utf8Path::new("")));
    let Some(first) = dirs.next() else {
        return Utf8PathBuf::new();
    };
    let mut common: Vec<&str> = first.components().map(|c| c.as_str()).collect();
    for dir in dirs {
        let shared = common
            .iter()
            .zip(dir.components())
            .take_while(|(a, b)| **a == b.as_str())
            .count();
        common.truncate(shared);
    }
    common.iter().collect()
}

fn emitted_path(
    source: &Utf8Path,
    common: &Utf8Path,
    dir: Option<&Utf8Path>,
    extension: &str,
) -> String {
    let stem = source.with_extension("");
    let placed = match dir {
        Some(dir) => {
            let relative = relative_lexically(&stem, common).unwrap_or_else(|| stem.clone());
            dir.join(relative)
        }
        None => stem,
    };
    format!("{placed}.{extension}")
}

fn prefix_with(cwd: &Utf8Path, output: &str) -> String {
    to_forward_slashes(normalize_lexically(&cwd.join(output)).as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tsc::CompilerOutput;
    use mockall::mock;
    use rstest::rstest;
    use serde_json::json;

    mock! {
        pub Tsc {}
        impl Compiler for Tsc {
            fn invoke(&self, cwd: &Utf8Path, args: &[String]) -> Result<CompilerOutput, TscError>;
            fn emitted_files(
                &self,
                cwd: &Utf8Path,
                args: &[String],
            ) -> Result<Option<Vec<String>>, TscError>;
        }
    }

    fn options(value: serde_json::Value) -> CompilerOptions {
        serde_json::from_value(value).expect("options object")
    }

    #[rstest]
    #[case(&["src/common/index.ts"], json!({"outDir": "output"}), ".", &["output/index.js"])]
    #[case(&["index.cts"], json!({"declaration": true, "outDir": ""}), ".", &["index.cjs", "index.d.cts"])]
    #[case(&["package/src/index.cts"], json!({"outDir": "dist"}), "package", &["package/dist/index.cjs"])]
    #[case(
        &["package/src/index.cts"],
        json!({"outDir": "dist", "rootDir": "."}),
        "package",
        &["package/dist/src/index.cjs"]
    )]
    #[case(&["src/a.mts", "src/b/c.ts"], json!({"outDir": "lib"}), ".", &["lib/a.mjs", "lib/b/c.js"])]
    #[case(&["src/view.tsx"], json!({"jsx": "preserve", "outDir": "out"}), ".", &["out/view.jsx"])]
    #[case(&["src/view.tsx"], json!({"jsx": "react-jsx", "outDir": "out"}), ".", &["out/view.js"])]
    #[case(&["src/a.js"], json!({}), ".", &[])]
    #[case(&["src/a.js", "src/b.ts"], json!({"outDir": "out"}), ".", &["out/a.js", "out/b.js"])]
    #[case(&["src/types.d.ts", "src/a.ts"], json!({"outDir": "out"}), ".", &["out/a.js"])]
    #[case(&["src/a.ts"], json!({"noEmit": true}), ".", &[])]
    #[case::javascript_declarations_in_place(
        &["src/a.js"],
        json!({"allowJs": true, "declaration": true, "emitDeclarationOnly": true}),
        ".",
        &["src/a.d.ts"]
    )]
    #[case::javascript_declarations_in_out_dir(
        &["src/a.js"],
        json!({"allowJs": true, "declaration": true, "outDir": "out"}),
        ".",
        &["out/a.js", "out/a.d.ts"]
    )]
    #[case::json_modules_copied(
        &["src/a.ts", "src/data.json"],
        json!({"resolveJsonModule": true, "outDir": "out"}),
        ".",
        &["out/a.js", "out/data.json"]
    )]
    #[case::json_modules_stay_without_out_dir(
        &["src/a.ts", "src/data.json"],
        json!({"resolveJsonModule": true}),
        ".",
        &["src/a.js"]
    )]
    fn maps_inputs_to_outputs(
        #[case] inputs: &[&str],
        #[case] opts: serde_json::Value,
        #[case] cwd: &str,
        #[case] expected: &[&str],
    ) {
        let outputs = output_files(inputs, &options(opts), Utf8Path::new(cwd));
        assert_eq!(outputs, expected);
    }

    #[test]
    fn emits_every_artifact_in_order() {
        let opts = options(json!({
            "outDir": "dist",
            "declarationDir": "types",
            "sourceMap": true,
            "composite": true,
            "declarationMap": true,
        }));
        let outputs = output_files(&["src/index.ts"], &opts, Utf8Path::new("."));
        assert_eq!(
            outputs,
            [
                "dist/index.js",
                "dist/index.js.map",
                "types/index.d.ts",
                "types/index.d.ts.map"
            ]
        );
    }

    #[test]
    fn declaration_only_skips_javascript() {
        let opts = options(json!({"declaration": true, "emitDeclarationOnly": true, "outDir": "d"}));
        let outputs = output_files(&["x/a.cts"], &opts, Utf8Path::new("."));
        assert_eq!(outputs, ["d/a.d.cts"]);
    }

    #[test]
    fn mapping_is_idempotent() {
        let opts = options(json!({"outDir": "dist", "declaration": true}));
        let inputs = ["src/a.ts", "src/nested/b.mts"];
        let first = output_files(&inputs, &opts, Utf8Path::new("pkg"));
        let second = output_files(&inputs, &opts, Utf8Path::new("pkg"));
        assert_eq!(first, second);
    }

    #[test]
    fn compiler_names_take_precedence() {
        let mut tsc = MockTsc::new();
        tsc.expect_emitted_files()
            .withf(|cwd, args| {
                cwd == Utf8Path::new("pkg")
                    && args
                        == [
                            "src/a.js",
                            "src/data.json",
                            "--allowJs",
                            "--declaration",
                            "--resolveJsonModule",
                        ]
            })
            .times(1)
            .returning(|_, _| {
                Ok(Some(vec![
                    "src/a.d.ts".to_owned(),
                    "src/data.json".to_owned(),
                ]))
            });
        let opts = options(json!({"allowJs": true, "declaration": true, "resolveJsonModule": true}));
        let outputs = declared_outputs(&tsc, &["pkg/src/a.js", "pkg/src/data.json"], &opts, Utf8Path::new("pkg"))
            .expect("outputs");
        assert_eq!(outputs, ["pkg/src/a.d.ts", "pkg/src/data.json"]);
    }

    #[test]
    fn names_are_derived_when_the_compiler_cannot_answer() {
        let mut tsc = MockTsc::new();
        tsc.expect_emitted_files().times(1).returning(|_, _| Ok(None));
        let opts = options(json!({"outDir": "out", "resolveJsonModule": true}));
        let outputs = declared_outputs(&tsc, &["src/a.ts", "src/data.json"], &opts, Utf8Path::new("."))
            .expect("outputs");
        assert_eq!(outputs, ["out/a.js", "out/data.json"]);
    }

    #[test]
    fn no_emit_skips_the_compiler() {
        let mut tsc = MockTsc::new();
        tsc.expect_emitted_files().never();
        let outputs = declared_outputs(&tsc, &["src/a.ts"], &options(json!({"noEmit": true})), Utf8Path::new("."))
            .expect("outputs");
        assert!(outputs.is_empty());
    }

    #[test]
    fn rejected_command_lines_are_errors() {
        let mut tsc = MockTsc::new();
        tsc.expect_emitted_files().returning(|_, _| {
            Err(TscError::CompilationFailed {
                diagnostics: vec!["error TS5023: Unknown compiler option '--bogus'.".to_owned()],
            })
        });
        let err = declared_outputs(&tsc, &["src/a.ts"], &options(json!({"bogus": true})), Utf8Path::new("."))
            .expect_err("rejected");
        assert!(matches!(err, TscError::CompilationFailed { .. }));
    }
}
