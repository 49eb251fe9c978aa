//! Host environment probe: operating-system family classification and the
//! Python toolchain gate, both evaluated once at startup.
//!
//! The probe is fallible rather than fatal so the library never terminates the
//! process itself; the command-line entry point routes probe errors through
//! [`Reporter::die`](crate::diag::Reporter::die).

use crate::utils::command_runner;
use crate::Error;

/// Oldest Python interpreter the build system's generator scripts support.
pub const MIN_PYTHON: (u32, u32) = (3, 9);

/// Operating-system family of the build host. Exactly one applies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OsFamily {
    /// Native win32/win64.
    NativeWindows,
    /// Cygwin layer on top of Windows.
    Cygwin,
    Linux,
    /// Darwin / macOS.
    Mac,
    FreeBsd,
    NetBsd,
}

impl OsFamily {
    /// Classify a platform-identification string (the `uname -s` output on
    /// Unix systems). Matching is case-sensitive; an unrecognized string is
    /// an error naming it, there is no degraded mode.
    pub fn classify(system_name: &str) -> Result<OsFamily, Error> {
        if system_name.contains("CYGWIN") {
            return Ok(OsFamily::Cygwin);
        }
        match system_name {
            "Microsoft" | "Windows" => Ok(OsFamily::NativeWindows),
            "Linux" => Ok(OsFamily::Linux),
            "FreeBSD" => Ok(OsFamily::FreeBsd),
            "NetBSD" => Ok(OsFamily::NetBsd),
            "Darwin" => Ok(OsFamily::Mac),
            other => Err(Error::UnsupportedPlatform(other.to_string())),
        }
    }
}

/// Immutable snapshot of the build host, produced by [`Environment::probe`].
#[derive(Clone, Debug)]
pub struct Environment {
    system_name: String,
    os: OsFamily,
    python: (u32, u32, u32),
}

impl Environment {
    /// Probe the host once: read the platform-identification string, classify
    /// it, and verify the `python3` interpreter meets [`MIN_PYTHON`].
    pub fn probe() -> Result<Environment, Error> {
        let system_name = system_name()?;
        let os = OsFamily::classify(&system_name)?;
        let python = python_version()?;
        if !check_python_version(python, MIN_PYTHON.0, MIN_PYTHON.1, 0) {
            return Err(Error::Python(format!(
                "need Python {}.{} or later, found {}.{}.{}",
                MIN_PYTHON.0, MIN_PYTHON.1, python.0, python.1, python.2
            )));
        }
        log::debug!(
            "environment probe: system={} os={:?} python={}.{}.{}",
            system_name,
            os,
            python.0,
            python.1,
            python.2
        );
        Ok(Environment {
            system_name,
            os,
            python,
        })
    }

    /// The raw platform-identification string the classification was made from.
    pub fn system_name(&self) -> &str {
        &self.system_name
    }

    pub fn os_family(&self) -> OsFamily {
        self.os
    }

    /// `(major, minor, micro)` of the probed `python3`.
    pub fn python_version(&self) -> (u32, u32, u32) {
        self.python
    }

    /// True iff on native win32/win64.
    pub fn on_native_windows(&self) -> bool {
        self.os == OsFamily::NativeWindows
    }

    /// True iff on Cygwin.
    pub fn on_cygwin(&self) -> bool {
        self.os == OsFamily::Cygwin
    }

    /// True iff on Windows, whether native or Cygwin.
    pub fn on_windows(&self) -> bool {
        matches!(self.os, OsFamily::NativeWindows | OsFamily::Cygwin)
    }

    pub fn on_linux(&self) -> bool {
        self.os == OsFamily::Linux
    }

    pub fn on_mac(&self) -> bool {
        self.os == OsFamily::Mac
    }

    pub fn on_freebsd(&self) -> bool {
        self.os == OsFamily::FreeBsd
    }

    pub fn on_netbsd(&self) -> bool {
        self.os == OsFamily::NetBsd
    }
}

/// True iff `found` is at least `(major, minor, fix)`.
pub fn check_python_version(found: (u32, u32, u32), major: u32, minor: u32, fix: u32) -> bool {
    found >= (major, minor, fix)
}

#[cfg(unix)]
fn system_name() -> Result<String, Error> {
    let output = command_runner::run_command("uname", &["-s"], None)?;
    if !output.status.success() {
        return Err(Error::Command(format!(
            "'uname -s' exited with {}",
            output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(windows)]
fn system_name() -> Result<String, Error> {
    // A native Windows build never goes through uname; Cygwin hosts run the
    // Unix build and report their CYGWIN_NT-* string above.
    Ok("Windows".to_string())
}

fn python_version() -> Result<(u32, u32, u32), Error> {
    if !command_runner::is_command_in_path("python3") {
        return Err(Error::Python(
            "python3 not found in PATH. The build system needs it for its generator scripts."
                .to_string(),
        ));
    }
    let output = command_runner::run_command(
        "python3",
        &["-c", "import sys; print('%d.%d.%d' % sys.version_info[:3])"],
        None,
    )?;
    if !output.status.success() {
        return Err(Error::Python(format!(
            "python3 version query exited with {}",
            output.status
        )));
    }
    parse_python_version(String::from_utf8_lossy(&output.stdout).trim())
}

fn parse_python_version(text: &str) -> Result<(u32, u32, u32), Error> {
    let mut parts = text.splitn(3, '.');
    let mut next = || -> Result<u32, Error> {
        parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| Error::Python(format!("unparseable python3 version '{}'", text)))
    };
    Ok((next()?, next()?, next()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_for(system_name: &str) -> Environment {
        Environment {
            system_name: system_name.to_string(),
            os: OsFamily::classify(system_name).unwrap(),
            python: (3, 11, 2),
        }
    }

    #[test]
    fn classification_covers_the_supported_set() {
        assert_eq!(OsFamily::classify("Linux").unwrap(), OsFamily::Linux);
        assert_eq!(OsFamily::classify("Darwin").unwrap(), OsFamily::Mac);
        assert_eq!(OsFamily::classify("FreeBSD").unwrap(), OsFamily::FreeBsd);
        assert_eq!(OsFamily::classify("NetBSD").unwrap(), OsFamily::NetBsd);
        assert_eq!(
            OsFamily::classify("Windows").unwrap(),
            OsFamily::NativeWindows
        );
        assert_eq!(
            OsFamily::classify("Microsoft").unwrap(),
            OsFamily::NativeWindows
        );
        assert_eq!(
            OsFamily::classify("CYGWIN_NT-10.0").unwrap(),
            OsFamily::Cygwin
        );
    }

    #[test]
    fn classification_is_case_sensitive() {
        assert!(OsFamily::classify("linux").is_err());
        assert!(OsFamily::classify("cygwin_nt").is_err());
    }

    #[test]
    fn unrecognized_platform_error_names_the_string() {
        let err = OsFamily::classify("SolarisX").unwrap_err();
        assert!(err.to_string().contains("SolarisX"));
    }

    #[test]
    fn linux_host_is_neither_windows_nor_mac() {
        let env = env_for("Linux");
        assert!(env.on_linux());
        assert!(!env.on_windows());
        assert!(!env.on_native_windows());
        assert!(!env.on_mac());
    }

    #[test]
    fn darwin_host_is_mac() {
        assert!(env_for("Darwin").on_mac());
    }

    #[test]
    fn cygwin_host_is_windows_but_not_native() {
        let env = env_for("CYGWIN_NT-10.0");
        assert!(env.on_cygwin());
        assert!(env.on_windows());
        assert!(!env.on_native_windows());
    }

    #[test]
    fn exactly_one_family_flag_is_true_per_supported_string() {
        for name in [
            "Linux",
            "Darwin",
            "FreeBSD",
            "NetBSD",
            "Windows",
            "CYGWIN_NT-10.0",
        ] {
            let env = env_for(name);
            let flags = [
                env.on_native_windows(),
                env.on_cygwin(),
                env.on_linux(),
                env.on_mac(),
                env.on_freebsd(),
                env.on_netbsd(),
            ];
            assert_eq!(flags.iter().filter(|&&f| f).count(), 1, "{}", name);
        }
    }

    #[test]
    fn python_version_comparison_is_lexicographic() {
        assert!(check_python_version((3, 9, 0), 3, 9, 0));
        assert!(check_python_version((3, 10, 1), 3, 9, 0));
        assert!(check_python_version((4, 0, 0), 3, 9, 0));
        assert!(!check_python_version((3, 8, 18), 3, 9, 0));
        assert!(!check_python_version((2, 7, 18), 3, 9, 0));
    }

    #[test]
    fn python_version_parses_dotted_triples() {
        assert_eq!(parse_python_version("3.11.2").unwrap(), (3, 11, 2));
        assert!(parse_python_version("3.11").is_err());
        assert!(parse_python_version("python 3").is_err());
    }
}
