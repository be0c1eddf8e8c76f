//! Node-style module resolution.
//!
//! Only what is needed to find the file a specifier names: built-in modules
//! are recognised and skipped, relative and absolute specifiers are resolved
//! against the requesting file, and bare specifiers walk `node_modules`
//! directories upwards honouring `package.json` `exports` and `main`.

use super::RequestKind;
use crate::canonical::normalize_lexically;
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Core modules that have no file on disk.
const BUILTIN_MODULES: &[&str] = &[
    "assert", "async_hooks", "buffer", "child_process", "cluster", "console", "constants",
    "crypto", "dgram", "diagnostics_channel", "dns", "domain", "events", "fs", "http", "http2",
    "https", "inspector", "module", "net", "os", "path", "perf_hooks", "process", "punycode",
    "querystring", "readline", "repl", "stream", "string_decoder", "sys", "timers", "tls",
    "trace_events", "tty", "url", "util", "v8", "vm", "wasi", "worker_threads", "zlib",
];

/// Extensions tried, in order, for extensionless `require` specifiers.
const REQUIRE_EXTENSIONS: &[&str] = &["js", "cjs", "mjs", "json", "node"];

/// Return `true` when `specifier` names a host module with no file.
///
/// # Examples
///
/// ```
/// use shinobi::capture::is_builtin;
///
/// assert!(is_builtin("node:fs"));
/// assert!(is_builtin("fs/promises"));
/// assert!(!is_builtin("./fs.js"));
/// ```
#[must_use]
pub fn is_builtin(specifier: &str) -> bool {
    if specifier.starts_with("node:") {
        return true;
    }
    let root = specifier.split('/').next().unwrap_or(specifier);
    BUILTIN_MODULES.contains(&root)
}

/// Resolves module specifiers to files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolver;

impl Resolver {
    /// Resolve `specifier`, requested from `caller` with `kind`.
    ///
    /// Returns `None` for built-in modules, non-file URLs and specifiers
    /// that name no existing file.
    #[must_use]
    pub fn resolve(self, caller: &Utf8Path, specifier: &str, kind: RequestKind) -> Option<Utf8PathBuf> {
        if is_builtin(specifier) || specifier.starts_with("data:") {
            return None;
        }
        let base = caller.parent().unwrap_or_else(|| Utf8Path::new("."));
        let resolved = if specifier.starts_with("file:") {
            file_url_path(specifier).and_then(|path| self.resolve_file(&path, kind))
        } else if is_path_like(specifier) {
            self.resolve_file(&base.join(specifier), kind)
        } else if specifier.contains("://") {
            None
        } else {
            self.resolve_package(base, specifier, kind)
        };
        if resolved.is_none() {
            debug!(caller = %caller, specifier, "module request did not resolve to a file");
        }
        resolved.map(|path| normalize_lexically(&path))
    }

    fn resolve_file(self, path: &Utf8Path, kind: RequestKind) -> Option<Utf8PathBuf> {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        // ES modules need the exact file name; CommonJS probes.
        if kind.is_async() {
            return None;
        }
        REQUIRE_EXTENSIONS
            .iter()
            .map(|ext| Utf8PathBuf::from(format!("{path}.{ext}")))
            .find(|candidate| candidate.is_file())
            .or_else(|| Self::resolve_directory(path))
    }

    fn resolve_directory(dir: &Utf8Path) -> Option<Utf8PathBuf> {
        if !dir.is_dir() {
            return None;
        }
        if let Some(main) = read_manifest(dir)
            .as_ref()
            .and_then(|manifest| manifest.get("main"))
            .and_then(Value::as_str)
        {
            let target = dir.join(main);
            if target.is_file() {
                return Some(target);
            }
            if let Some(found) = REQUIRE_EXTENSIONS
                .iter()
                .map(|ext| Utf8PathBuf::from(format!("{target}.{ext}")))
                .find(|candidate| candidate.is_file())
            {
                return Some(found);
            }
        }
        REQUIRE_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("index.{ext}")))
            .find(|candidate| candidate.is_file())
    }

    fn resolve_package(self, base: &Utf8Path, specifier: &str, kind: RequestKind) -> Option<Utf8PathBuf> {
        let (name, subpath) = split_package_specifier(specifier);
        for dir in base.ancestors() {
            let package_dir = dir.join("node_modules").join(name);
            if !package_dir.is_dir() {
                continue;
            }
            let manifest = read_manifest(&package_dir);
            if let Some(exports) = manifest.as_ref().and_then(|m| m.get("exports")) {
                let key = subpath.map_or_else(|| ".".to_owned(), |sub| format!("./{sub}"));
                return resolve_exports(exports, &key, kind)
                    .map(|target| package_dir.join(target))
                    .filter(|target| target.is_file());
            }
            return match subpath {
                Some(sub) => self.resolve_file(&package_dir.join(sub), RequestKind::Require),
                None => Self::resolve_directory(&package_dir),
            };
        }
        None
    }
}

fn is_path_like(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
        || Utf8Path::new(specifier).is_absolute()
}

/// Decode a `file:` URL into the path it names.
fn file_url_path(specifier: &str) -> Option<Utf8PathBuf> {
    let path = Url::parse(specifier).ok()?.to_file_path().ok()?;
    Utf8PathBuf::from_path_buf(path).ok()
}

/// Split `@scope/name/sub/path` or `name/sub/path` into name and subpath.
fn split_package_specifier(specifier: &str) -> (&str, Option<&str>) {
    let name_parts = if specifier.starts_with('@') { 2 } else { 1 };
    let mut boundary = None;
    for (count, (index, _)) in specifier.match_indices('/').enumerate() {
        if count + 1 == name_parts {
            boundary = Some(index);
            break;
        }
    }
    match boundary {
        Some(index) => {
            let (name, rest) = specifier.split_at(index);
            (name, rest.strip_prefix('/').filter(|sub| !sub.is_empty()))
        }
        None => (specifier, None),
    }
}

fn read_manifest(dir: &Utf8Path) -> Option<Value> {
    let text = std::fs::read_to_string(dir.join("package.json")).ok()?;
    serde_json::from_str(&text).ok()
}

/// Resolve `key` (`.` or `./sub`) through a package's `exports` field.
fn resolve_exports(exports: &Value, key: &str, kind: RequestKind) -> Option<String> {
    let is_subpath_map = exports
        .as_object()
        .is_some_and(|map| map.keys().any(|k| k.starts_with('.')));
    if !is_subpath_map {
        return (key == ".").then(|| resolve_conditions(exports, kind)).flatten();
    }
    let map = exports.as_object()?;
    if let Some(target) = map.get(key) {
        return resolve_conditions(target, kind);
    }
    map.iter().find_map(|(pattern, target)| {
        let (prefix, suffix) = pattern.split_once('*')?;
        let matched = key.strip_prefix(prefix)?.strip_suffix(suffix)?;
        resolve_conditions(target, kind).map(|resolved| resolved.replace('*', matched))
    })
}

fn resolve_conditions(target: &Value, kind: RequestKind) -> Option<String> {
    let wanted = if kind.is_async() { "import" } else { "require" };
    match target {
        Value::String(path) => Some(path.clone()),
        Value::Array(options) => options
            .iter()
            .find_map(|option| resolve_conditions(option, kind)),
        Value::Object(conditions) => conditions
            .iter()
            .filter(|(condition, _)| {
                matches!(condition.as_str(), "node" | "default") || condition.as_str() == wanted
            })
            .find_map(|(_, value)| resolve_conditions(value, kind)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};
    use rstest::rstest;

    #[rstest]
    #[case("node:test", true)]
    #[case("path", true)]
    #[case("fs/promises", true)]
    #[case("lodash", false)]
    #[case("./path", false)]
    fn recognises_builtins(#[case] specifier: &str, #[case] expected: bool) {
        assert_eq!(is_builtin(specifier), expected);
    }

    #[rstest]
    #[case("pkg", "pkg", None)]
    #[case("pkg/sub/file.js", "pkg", Some("sub/file.js"))]
    #[case("@scope/pkg", "@scope/pkg", None)]
    #[case("@scope/pkg/deep", "@scope/pkg", Some("deep"))]
    fn splits_package_specifiers(#[case] spec: &str, #[case] name: &str, #[case] sub: Option<&str>) {
        assert_eq!(split_package_specifier(spec), (name, sub));
    }

    #[test]
    fn exports_prefer_matching_conditions_in_declaration_order() {
        let exports = serde_json::json!({
            ".": { "import": "./esm/index.mjs", "require": "./cjs/index.cjs" },
            "./feature/*": { "default": "./lib/feature/*.js" }
        });
        assert_eq!(
            resolve_exports(&exports, ".", RequestKind::Static).as_deref(),
            Some("./esm/index.mjs")
        );
        assert_eq!(
            resolve_exports(&exports, ".", RequestKind::Require).as_deref(),
            Some("./cjs/index.cjs")
        );
        assert_eq!(
            resolve_exports(&exports, "./feature/x", RequestKind::Require).as_deref(),
            Some("./lib/feature/x.js")
        );
        assert_eq!(resolve_exports(&exports, "./missing", RequestKind::Static), None);
    }

    #[test]
    fn resolves_relative_and_package_requests() -> Result<()> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = Utf8Path::from_path(temp.path()).context("utf8 temp dir")?;
        let files = [
            ("src/main.mjs", ""),
            ("src/util.cjs", ""),
            ("src/lib/index.js", ""),
            ("node_modules/dep/package.json", r#"{"main": "lib/entry"}"#),
            ("node_modules/dep/lib/entry.js", ""),
        ];
        for (path, body) in files {
            let full = root.join(path);
            std::fs::create_dir_all(full.parent().context("parent")?).context("mkdir")?;
            std::fs::write(&full, body).context("write fixture")?;
        }
        let caller = root.join("src/main.mjs");
        let resolver = Resolver;

        assert_eq!(
            resolver.resolve(&caller, "./util.cjs", RequestKind::Static),
            Some(root.join("src/util.cjs"))
        );
        assert_eq!(
            resolver.resolve(&caller, "./util", RequestKind::Require),
            Some(root.join("src/util.cjs"))
        );
        assert_eq!(resolver.resolve(&caller, "./util", RequestKind::Static), None);
        assert_eq!(
            resolver.resolve(&caller, "./lib", RequestKind::Require),
            Some(root.join("src/lib/index.js"))
        );
        assert_eq!(
            resolver.resolve(&caller, "dep", RequestKind::Require),
            Some(root.join("node_modules/dep/lib/entry.js"))
        );
        assert_eq!(resolver.resolve(&caller, "node:fs", RequestKind::Require), None);
        Ok(())
    }

    #[test]
    fn file_urls_are_percent_decoded() -> Result<()> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = Utf8Path::from_path(temp.path()).context("utf8 temp dir")?;
        let target = root.join("a b/x.mjs");
        std::fs::create_dir_all(root.join("a b")).context("mkdir")?;
        std::fs::write(&target, "").context("write fixture")?;
        let url = Url::from_file_path(&target)
            .map_err(|()| anyhow::anyhow!("file url for {target}"))?;
        assert!(url.as_str().contains("a%20b"), "got {url}");

        let caller = root.join("main.mjs");
        assert_eq!(
            Resolver.resolve(&caller, url.as_str(), RequestKind::Dynamic),
            Some(target)
        );
        assert_eq!(
            Resolver.resolve(&caller, "file://remote-host/x.mjs", RequestKind::Dynamic),
            None
        );
        Ok(())
    }
}
