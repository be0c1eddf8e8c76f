//! The two interception points that feed one dependency record.
//!
//! `require` requests are resolved synchronously on the main context.
//! `import` requests are answered by a dedicated loader thread that shares no
//! state with the caller: it receives [`LoadRequest`]s and reports each
//! outcome as a [`LoadEvent`] over a channel created at registration. Both
//! hooks record through `&mut CaptureContext`, so they can only run once the
//! record is open.

use super::{CaptureContext, CaptureError, RequestKind, Resolver};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Resolves `require` calls on the main context.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncHook {
    resolver: Resolver,
}

impl SyncHook {
    /// Create a hook backed by `resolver`.
    #[must_use]
    pub const fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    /// Resolve `specifier` from the directory of `caller` and record it.
    ///
    /// Returns the resolved file, or `None` for built-in modules and
    /// specifiers that resolve to nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Write`] when the record cannot be appended to.
    pub fn on_require(
        &self,
        ctx: &mut CaptureContext,
        caller: &Utf8Path,
        specifier: &str,
    ) -> Result<Option<Utf8PathBuf>, CaptureError> {
        let Some(path) = self
            .resolver
            .resolve(caller, specifier, RequestKind::Require)
        else {
            return Ok(None);
        };
        ctx.record_discovered(&path)?;
        Ok(Some(path))
    }
}

/// A module load posted to the loader thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// File containing the request.
    pub caller: Utf8PathBuf,
    /// Specifier as written.
    pub specifier: String,
    /// Import syntax used.
    pub kind: RequestKind,
}

/// The loader thread's answer to one [`LoadRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    /// The module was loaded from `path`.
    Loaded {
        /// Resolved file.
        path: Utf8PathBuf,
    },
    /// The specifier named a built-in or missing module.
    Skipped {
        /// Specifier as written.
        specifier: String,
    },
}

/// Handle to the loader thread serving `import` requests.
#[derive(Debug)]
pub struct AsyncHook {
    requests: Sender<LoadRequest>,
    events: Receiver<LoadEvent>,
    worker: JoinHandle<()>,
    pending: usize,
}

impl AsyncHook {
    /// Spawn the loader thread and the channels connecting it to the caller.
    #[must_use]
    pub fn register(resolver: Resolver) -> Self {
        let (requests, inbox) = mpsc::channel::<LoadRequest>();
        let (outbox, events) = mpsc::channel::<LoadEvent>();
        let worker = thread::spawn(move || {
            for request in inbox {
                let event = match resolver.resolve(&request.caller, &request.specifier, request.kind)
                {
                    Some(path) => LoadEvent::Loaded { path },
                    None => LoadEvent::Skipped {
                        specifier: request.specifier,
                    },
                };
                if outbox.send(event).is_err() {
                    break;
                }
            }
        });
        Self {
            requests,
            events,
            worker,
            pending: 0,
        }
    }

    /// Requests posted but not yet answered.
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.pending
    }

    /// Post an `import` of `specifier` made by `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::LoaderDisconnected`] when the loader thread
    /// has stopped.
    pub fn request(
        &mut self,
        caller: &Utf8Path,
        specifier: &str,
        kind: RequestKind,
    ) -> Result<(), CaptureError> {
        let request = LoadRequest {
            caller: caller.to_path_buf(),
            specifier: specifier.to_owned(),
            kind,
        };
        self.requests
            .send(request)
            .map_err(|_| CaptureError::LoaderDisconnected)?;
        self.pending += 1;
        Ok(())
    }

    /// Wait for the next answer and record it.
    ///
    /// Returns the loaded file, or `None` when the answer was a skip or no
    /// requests are pending.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::LoaderDisconnected`] when the loader thread
    /// exits with requests outstanding, or a recording error.
    pub fn listen(&mut self, ctx: &mut CaptureContext) -> Result<Option<Utf8PathBuf>, CaptureError> {
        if self.pending == 0 {
            return Ok(None);
        }
        let event = self
            .events
            .recv()
            .map_err(|_| CaptureError::LoaderDisconnected)?;
        self.pending -= 1;
        match event {
            LoadEvent::Loaded { path } => {
                ctx.record_discovered(&path)?;
                Ok(Some(path))
            }
            LoadEvent::Skipped { specifier } => {
                debug!(specifier, "import not recorded");
                Ok(None)
            }
        }
    }

    /// Close the request channel and join the loader thread.
    pub fn shutdown(self) {
        let Self {
            requests, worker, ..
        } = self;
        drop(requests);
        if let Err(err) = worker.join() {
            warn!("module loader thread panicked: {err:?}");
        }
    }
}
