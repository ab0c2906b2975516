//! The structured diagnostic stream produced by every ingest stage.
//!
//! A `Mutex`-guarded accumulator of typed records with
//! `print`/`to_json`/`write_to_file`, covering the five-way
//! [`DiagnosticKind`] the pipeline stages emit, with thread-local buffering
//! for a worker pool: each worker accumulates into its own buffer and
//! flushes into the shared `Vec` at a stage boundary, so the final message
//! order reflects flush order rather than wall-clock emission order.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::ast::SourceLoc;

/// `Todo` is treated as an error: a recognized-but-unimplemented construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    Todo,
    Error,
    Warning,
    Info,
    Debug,
}

impl DiagnosticKind {
    pub fn is_error(self) -> bool {
        matches!(self, DiagnosticKind::Todo | DiagnosticKind::Error)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::Todo => "todo",
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Info => "info",
            DiagnosticKind::Debug => "debug",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub context: String,
    pub pass_name: String,
    pub origin_symbol: String,
    pub location: Option<SourceLoc>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{}:{}:{}: ", loc.file, loc.line, loc.column)?;
        }
        write!(f, "{}: {}", self.kind, self.message)?;
        if !self.context.is_empty() {
            write!(f, " ({})", self.context)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct ThreadLocalBuffer {
    messages: Vec<Diagnostic>,
    has_error: bool,
}

thread_local! {
    static THREAD_LOCAL: RefCell<ThreadLocalBuffer> = RefCell::new(ThreadLocalBuffer::default());
}

/// The shared diagnostic sink threaded through one `convert()` call. Each
/// worker may buffer locally (`enable_thread_local`) and calls
/// [`Diagnostics::flush_thread_local`] at a stage boundary; readers only
/// ever see the shared `messages()` list.
pub struct Diagnostics {
    thread_local_enabled: bool,
    messages: Mutex<Vec<Diagnostic>>,
    has_error: AtomicBool,
    on_error: Mutex<Option<Box<dyn FnMut() + Send>>>,
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("messages", &self.messages.lock().unwrap().len())
            .field("has_error", &self.has_error.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            thread_local_enabled: false,
            messages: Mutex::new(Vec::new()),
            has_error: AtomicBool::new(false),
            on_error: Mutex::new(None),
        }
    }

    pub fn enable_thread_local(&mut self, enable: bool) {
        self.thread_local_enabled = enable;
    }

    pub fn set_on_error(&self, callback: impl FnMut() + Send + 'static) {
        *self.on_error.lock().unwrap() = Some(Box::new(callback));
    }

    fn add(
        &self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        context: impl Into<String>,
        pass_name: impl Into<String>,
        origin_symbol: impl Into<String>,
        location: Option<SourceLoc>,
    ) {
        let diag = Diagnostic {
            kind,
            message: message.into(),
            context: context.into(),
            pass_name: pass_name.into(),
            origin_symbol: origin_symbol.into(),
            location,
        };
        let is_error = kind.is_error();
        if self.thread_local_enabled {
            THREAD_LOCAL.with(|cell| {
                let mut buf = cell.borrow_mut();
                buf.messages.push(diag);
                buf.has_error |= is_error;
            });
        } else {
            self.messages.lock().unwrap().push(diag);
        }
        if is_error && !self.has_error.swap(true, Ordering::SeqCst) {
            if let Some(cb) = self.on_error.lock().unwrap().as_mut() {
                cb();
            }
        }
    }

    /// Moves the calling thread's buffered diagnostics into the shared
    /// list. Called at pipeline stage boundaries, not per-message, so
    /// contention stays rare.
    pub fn flush_thread_local(&self) {
        THREAD_LOCAL.with(|cell| {
            let mut buf = cell.borrow_mut();
            if buf.messages.is_empty() {
                return;
            }
            let mut shared = self.messages.lock().unwrap();
            shared.append(&mut buf.messages);
            if buf.has_error {
                self.has_error.store(true, Ordering::SeqCst);
                buf.has_error = false;
            }
        });
    }

    pub fn todo(&self, message: impl Into<String>, context: impl Into<String>) {
        self.add(DiagnosticKind::Todo, message, context, "", "", None);
    }

    pub fn error(&self, message: impl Into<String>, context: impl Into<String>) {
        self.add(DiagnosticKind::Error, message, context, "", "", None);
    }

    pub fn warning(&self, message: impl Into<String>, context: impl Into<String>) {
        self.add(DiagnosticKind::Warning, message, context, "", "", None);
    }

    pub fn info(&self, message: impl Into<String>, context: impl Into<String>) {
        self.add(DiagnosticKind::Info, message, context, "", "", None);
    }

    pub fn debug(&self, message: impl Into<String>, context: impl Into<String>) {
        self.add(DiagnosticKind::Debug, message, context, "", "", None);
    }

    /// `todo`/`error`/`warn` overloads keyed by a source location and the
    /// AST symbol they originate from, for call sites that already have
    /// both in hand and want them recorded on the diagnostic itself rather
    /// than folded into a free-text message.
    pub fn todo_at(&self, loc: SourceLoc, origin_symbol: impl Into<String>, message: impl Into<String>) {
        self.add(DiagnosticKind::Todo, message, "", "", origin_symbol, Some(loc));
    }

    pub fn error_at(&self, loc: SourceLoc, origin_symbol: impl Into<String>, message: impl Into<String>) {
        self.add(DiagnosticKind::Error, message, "", "", origin_symbol, Some(loc));
    }

    pub fn warn_at(&self, loc: SourceLoc, origin_symbol: impl Into<String>, message: impl Into<String>) {
        self.add(DiagnosticKind::Warning, message, "", "", origin_symbol, Some(loc));
    }

    pub fn messages(&self) -> Vec<Diagnostic> {
        self.messages.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().unwrap().is_empty()
    }

    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
        self.has_error.store(false, Ordering::SeqCst);
    }

    pub fn print(&self) {
        for diag in self.messages.lock().unwrap().iter() {
            eprintln!("{diag}");
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&*self.messages.lock().unwrap())
    }

    pub fn write_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
