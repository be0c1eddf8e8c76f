//! Runtime dependency capture for spawned scripts.
//!
//! A [`CaptureContext`] owns the `<output>.depfile` of one script run.
//! [`trace`] walks the modules the entry script reaches: `require` requests
//! go through the [`SyncHook`], `import` requests through the loader thread
//! behind the [`AsyncHook`], and both record into the same context. Scripts
//! may also name files the module system cannot see via
//! [`CaptureContext::add_dependency`].

mod context;
mod error;
mod hooks;
mod resolve;
mod scan;

pub use context::CaptureContext;
pub use error::CaptureError;
pub use hooks::{AsyncHook, LoadEvent, LoadRequest, SyncHook};
pub use resolve::{Resolver, is_builtin};
pub use scan::{ModuleRequest, RequestKind, scan_requests};

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Source extensions the tracer reads for further requests.
const SCANNED_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "mts", "cts"];

/// Record `entry` and every module it transitively loads into `ctx`.
///
/// # Errors
///
/// Returns [`CaptureError`] when the entry script is missing, a reached
/// module cannot be read, the loader thread stops, or the record cannot be
/// written.
pub fn trace(ctx: &mut CaptureContext, entry: &Utf8Path) -> Result<(), CaptureError> {
    let resolver = Resolver;
    let sync_hook = SyncHook::new(resolver);
    let mut async_hook = AsyncHook::register(resolver);
    let result = walk(ctx, entry, sync_hook, &mut async_hook);
    async_hook.shutdown();
    result
}

fn walk(
    ctx: &mut CaptureContext,
    entry: &Utf8Path,
    sync_hook: SyncHook,
    async_hook: &mut AsyncHook,
) -> Result<(), CaptureError> {
    let entry = if entry.is_relative() {
        ctx.root().join(entry)
    } else {
        entry.to_path_buf()
    };
    ctx.record_dependency(&entry)?;

    let mut queue = Modules::default();
    queue.push(entry);
    loop {
        while let Some(module) = queue.next() {
            for request in read_requests(&module)? {
                if request.kind.is_async() {
                    async_hook.request(&module, &request.specifier, request.kind)?;
                } else if let Some(path) = sync_hook.on_require(ctx, &module, &request.specifier)? {
                    queue.push(path);
                }
            }
        }
        if async_hook.pending() == 0 {
            break;
        }
        if let Some(path) = async_hook.listen(ctx)? {
            queue.push(path);
        }
    }
    info!(
        output = ctx.output(),
        dependencies = ctx.recorded().count(),
        "traced module graph"
    );
    Ok(())
}

fn read_requests(module: &Utf8Path) -> Result<Vec<ModuleRequest>, CaptureError> {
    let scannable = module
        .extension()
        .is_some_and(|ext| SCANNED_EXTENSIONS.contains(&ext));
    if !scannable {
        return Ok(Vec::new());
    }
    let source = std::fs::read_to_string(module).map_err(|source| CaptureError::ReadModule {
        path: module.to_path_buf(),
        source,
    })?;
    let requests = scan_requests(&source);
    debug!(module = %module, requests = requests.len(), "scanned module");
    Ok(requests)
}

/// Breadth-first work list that visits each module once.
#[derive(Debug, Default)]
struct Modules {
    seen: IndexSet<Utf8PathBuf>,
    queue: VecDeque<Utf8PathBuf>,
}

impl Modules {
    fn push(&mut self, module: Utf8PathBuf) {
        if self.seen.insert(module.clone()) {
            self.queue.push_back(module);
        }
    }

    fn next(&mut self) -> Option<Utf8PathBuf> {
        self.queue.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::Canonicalizer;
    use anyhow::{Context, Result};
    use itertools::Itertools;

    fn fixture(files: &[(&str, &str)]) -> Result<(tempfile::TempDir, Canonicalizer)> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = Utf8Path::from_path(temp.path()).context("utf8 temp dir")?;
        for (path, body) in files {
            let full = root.join(path);
            std::fs::create_dir_all(full.parent().context("parent")?).context("mkdir")?;
            std::fs::write(&full, body).context("write fixture")?;
        }
        let canon = Canonicalizer::new(root)?;
        Ok((temp, canon))
    }

    #[test]
    fn traces_imports_and_requires_transitively() -> Result<()> {
        let (_temp, canon) = fixture(&[
            (
                "script.mjs",
                "import { one } from './one.mjs';\nimport { createRequire } from 'node:module';\nconst require = createRequire(import.meta.url);\nrequire('./two.cjs');\n",
            ),
            ("one.mjs", "export const one = await import('./lazy/three.mjs');\n"),
            ("two.cjs", "module.exports = require('./data');\n"),
            ("data.json", "{}"),
            ("lazy/three.mjs", "import '../one.mjs';\n"),
        ])?;
        let mut ctx = CaptureContext::open_in(canon, "out.txt")?;
        trace(&mut ctx, Utf8Path::new("script.mjs"))?;
        let recorded: Vec<_> = ctx.recorded().sorted().collect();
        assert_eq!(
            recorded,
            vec!["data.json", "lazy/three.mjs", "one.mjs", "script.mjs", "two.cjs"]
        );
        Ok(())
    }

    #[test]
    fn missing_entry_is_an_error() -> Result<()> {
        let (_temp, canon) = fixture(&[])?;
        let mut ctx = CaptureContext::open_in(canon, "out.txt")?;
        let err = trace(&mut ctx, Utf8Path::new("absent.mjs")).unwrap_err();
        assert!(matches!(err, CaptureError::Canonicalize { .. }));
        Ok(())
    }

    #[test]
    fn unresolved_requests_are_not_recorded() -> Result<()> {
        let (_temp, canon) = fixture(&[(
            "script.cjs",
            "require('./missing');\nrequire('fs');\nimport('pkg-not-installed');\n",
        )])?;
        let mut ctx = CaptureContext::open_in(canon, "out.txt")?;
        trace(&mut ctx, Utf8Path::new("script.cjs"))?;
        assert_eq!(ctx.recorded().collect::<Vec<_>>(), vec!["script.cjs"]);
        Ok(())
    }
}
