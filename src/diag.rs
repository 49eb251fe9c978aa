//! The `diag` module is the console-facing message service for the build
//! system: verbosity-gated output, bracketed `[TAG] text` diagnostics, and the
//! `warn`/`die` pair every other component routes its reporting through.
//!
//! Product output is deliberately separate from the developer-facing `log`
//! traces: everything here goes to a single writer (stdout in production) so
//! that messages, warnings, and fatal errors interleave in execution order in
//! build logs.

use std::backtrace::Backtrace;
use std::io::{self, Write};
use std::process;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

/// Verbosity assumed before anyone calls [`Reporter::set_verbosity`].
pub const DEFAULT_VERBOSITY: i32 = 1;

/// Format a tagged diagnostic as `"[tag] text"`.
pub fn bracket(tag: &str, text: &str) -> String {
    format!("[{}] {}", tag, text)
}

/// Console reporter owning the verbosity level and the output stream.
///
/// A single `Reporter` instance is created at startup and handed to every
/// component that wants to talk to the user; there is no ambient global state.
/// The level lives in an [`AtomicI32`] and the writer behind a [`Mutex`], so a
/// reporter shared between threads is safe to use from all of them.
pub struct Reporter<W: Write> {
    verbosity: AtomicI32,
    tag: String,
    out: Mutex<W>,
}

impl Reporter<io::Stdout> {
    /// The production reporter: writes to standard output.
    pub fn stdout() -> Self {
        Reporter::with_writer(io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    /// Build a reporter over an arbitrary writer (tests use `Vec<u8>`).
    pub fn with_writer(out: W) -> Self {
        Reporter {
            verbosity: AtomicI32::new(DEFAULT_VERBOSITY),
            tag: "BUILDBASE".to_string(),
            out: Mutex::new(out),
        }
    }

    /// Replace the tool tag used by [`warn`](Self::warn) and
    /// [`die`](Self::die) brackets.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set the verbosity level. 0 is quiet, 99 is very very noisy.
    /// No validation; negative levels silence even level-0 messages.
    pub fn set_verbosity(&self, v: i32) {
        self.verbosity.store(v, Ordering::Relaxed);
    }

    /// Current verbosity level.
    pub fn verbosity(&self) -> i32 {
        self.verbosity.load(Ordering::Relaxed)
    }

    /// True iff the configured verbosity is at least `level`.
    pub fn is_verbose(&self, level: i32) -> bool {
        self.verbosity() >= level
    }

    fn emit(&self, text: &str, indent: &str, newline: bool) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        // Write failures on the build-log stream are not recoverable here.
        let _ = write!(out, "{}{}", indent, text);
        if newline {
            let _ = writeln!(out);
        }
        let _ = out.flush();
    }

    /// Emit `indent` then `text` and a trailing newline.
    pub fn message(&self, text: &str, indent: &str) {
        self.emit(text, indent, true);
    }

    /// Emit `indent` then `text` without a trailing newline.
    pub fn message_no_newline(&self, text: &str, indent: &str) {
        self.emit(text, indent, false);
    }

    /// Emit a bracketed `[tag] text` line.
    pub fn bracketed_message(&self, tag: &str, text: &str, indent: &str) {
        self.message(&bracket(tag, text), indent);
    }

    /// [`message`](Self::message), gated on [`is_verbose`](Self::is_verbose).
    pub fn verbose_message(&self, level: i32, text: &str, indent: &str) {
        if self.is_verbose(level) {
            self.message(text, indent);
        }
    }

    /// [`bracketed_message`](Self::bracketed_message), gated on verbosity.
    pub fn verbose_bracketed_message(&self, level: i32, tag: &str, text: &str, indent: &str) {
        self.verbose_message(level, &bracket(tag, text), indent);
    }

    /// Emit a non-fatal `[<TAG> WARNING] text` line and keep going.
    pub fn warn(&self, text: &str) {
        self.bracketed_message(&format!("{} WARNING", self.tag), text, "");
    }

    fn report_fatal(&self, text: &str, extra: &str) {
        self.bracketed_message(
            &format!("{} ERROR", self.tag),
            &format!("{} {}\n", text, extra),
            "",
        );
        // The stack goes to the same stream as the message, never stderr.
        self.message(&Backtrace::force_capture().to_string(), "");
    }

    /// Emit a `[<TAG> ERROR]` line with the current call stack, then
    /// terminate the process with exit status 1.
    ///
    /// This is the sole abnormal-termination path of the tool; library code
    /// returns [`Error`](crate::Error) and the command-line entry point routes
    /// it here so every fatal condition produces the same diagnostic shape.
    pub fn die(&self, text: &str, extra: &str) -> ! {
        self.report_fatal(text, extra);
        process::exit(1);
    }

    /// [`die`](Self::die) iff `status` is non-zero, reporting the external
    /// command that produced it on a `[CMD]` line.
    pub fn conditional_die(&self, status: i32, command: &str, text: &str) {
        if status != 0 {
            self.die(&format!("{}\n  [CMD] {}", text, command), "");
        }
    }

    /// Consume the reporter and hand back the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}
