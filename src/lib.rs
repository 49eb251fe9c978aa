//! `buildbase` is the support layer of a build-automation tool: verbosity-gated
//! console messages, uniform warning/fatal diagnostics, host environment
//! detection (operating-system family and the Python toolchain gate), and
//! helpers for coercing command-output bytes into text using the host's
//! preferred encoding.
//!
//! ## Features
//! - Verbosity-gated `[TAG] text` message service writing to stdout, so
//!   messages and errors interleave in execution order in build logs.
//! - `warn`/`die` reporting with call-stack context; every fatal condition in
//!   the tool exits through the same path with status 1.
//! - One-time host probe: OS-family classification from the platform
//!   identification string, and enforcement of the minimum supported Python.
//! - Byte/text normalization against the locale's preferred encoding.
//!
//! ## Usage (CLI)
//! ```bash
//! # Report the probed environment, then run one build step with uniform
//! # failure diagnostics:
//! buildbase --verbosity 2 -- make -j4
//! ```

pub mod app_config;
pub mod diag;
pub mod environment;
pub mod text;
pub mod utils;

use std::io::Write;

use app_config::AppConfig;
use diag::Reporter;
use environment::Environment;
use text::TextCodec;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Could not detect operating system type: {0}")]
    UnsupportedPlatform(String),
    #[error("Python toolchain check failed: {0}")]
    Python(String),
    #[error("Command execution failed: {0}")]
    Command(String),
}

/// Parse the command line, probe the host, and run the requested build step
/// (if any) with the reporter's diagnostics.
///
/// Errors propagate to the caller; the binary routes them through
/// [`Reporter::die`] so the process-level contract (uniform fatal report,
/// exit status 1) holds at the outermost layer only.
pub fn run<W: Write>(reporter: &Reporter<W>) -> Result<(), Error> {
    // Ensure the trace logger is initialized exactly once, whoever calls in.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init()
        .ok();

    let config = AppConfig::new();
    reporter.set_verbosity(config.effective_verbosity()?);
    log::debug!("using configuration: {:?}", config);

    let env = Environment::probe()?;
    let codec = TextCodec::from_locale();

    reporter.verbose_bracketed_message(1, "PLATFORM", env.system_name(), "");
    let (major, minor, micro) = env.python_version();
    reporter.verbose_bracketed_message(
        2,
        "PYTHON",
        &format!("{}.{}.{}", major, minor, micro),
        "",
    );
    reporter.verbose_bracketed_message(2, "ENCODING", codec.name(), "");

    if let Some((name, args)) = config.command.split_first() {
        let printable = utils::command_runner::format_command(name, args);
        reporter.verbose_bracketed_message(1, "RUN", &printable, "");

        let output = utils::command_runner::run_command(name, args, None)?;
        // Captured step output is relayed in execution order, stdout first.
        reporter.message_no_newline(&codec.decode_bytes(&output.stdout), "");
        reporter.message_no_newline(&codec.decode_bytes(&output.stderr), "");

        // A signal-terminated step has no exit code; treat it as failed.
        let status = output.status.code().unwrap_or(1);
        reporter.conditional_die(status, &printable, "external build step failed");
        reporter.verbose_bracketed_message(1, "OK", &printable, "");
    }

    Ok(())
}
