use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use crate::Error;

/// Render a command line the way failure diagnostics print it on the `[CMD]`
/// line: the program name followed by its space-separated arguments.
pub fn format_command(command_name: &str, args: &[impl AsRef<OsStr>]) -> String {
    let mut printable = String::from(command_name);
    for arg in args {
        printable.push(' ');
        printable.push_str(&arg.as_ref().to_string_lossy());
    }
    printable
}

/// Run an external build step with captured stdio.
///
/// Failure to spawn the program at all is an [`Error::Command`]. A spawned
/// program that exits non-zero is not an error here: the [`Output`] carries
/// the status so the caller can relay the captured streams and decide whether
/// to route the failure through `conditional_die`.
pub fn run_command(
    command_name: &str,
    args: &[impl AsRef<OsStr>],
    current_dir: Option<&Path>,
) -> Result<Output, Error> {
    log::debug!(
        "running command: {} (in {:?})",
        format_command(command_name, args),
        current_dir.unwrap_or_else(|| Path::new("."))
    );

    let mut cmd = Command::new(command_name);
    cmd.args(args);

    if let Some(dir) = current_dir {
        cmd.current_dir(dir);
    }

    // Capture stdio so the caller can relay it through the reporter instead
    // of letting it race the tool's own messages on the terminal.
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let output = cmd.output().map_err(|e| {
        Error::Command(format!(
            "failed to execute '{}': {}. Is it installed and in your PATH?",
            command_name, e
        ))
    })?;

    if output.status.success() {
        log::debug!("command '{}' succeeded", command_name);
    } else {
        log::warn!("command '{}' exited with {}", command_name, output.status);
    }
    Ok(output)
}

/// Cheap PATH presence probe: ask the program for its version and only treat
/// a NotFound spawn error as absence. A program that rejects `--version` still
/// counts as present.
pub fn is_command_in_path(command_name: &str) -> bool {
    match Command::new(command_name)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(_) => true,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::NotFound {
                log::warn!("command '{}' not found in PATH", command_name);
                false
            } else {
                log::debug!(
                    "command '{}' check errored (assuming it exists): {}",
                    command_name,
                    e
                );
                true
            }
        }
    }
}
