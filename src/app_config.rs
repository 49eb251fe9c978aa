use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::diag::DEFAULT_VERBOSITY;
use crate::Error;

/// Config file picked up from the working directory when `--config` is not
/// given. Absence is fine; an unreadable explicit `--config` path is not.
pub const DEFAULT_CONFIG_FILE: &str = "buildbase.toml";

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Verbosity level: 0 is quiet, 99 is very noisy
    #[clap(short, long, value_parser)]
    pub verbosity: Option<i32>,

    /// Path to a TOML config file (default: ./buildbase.toml when present)
    #[clap(short, long, value_parser)]
    pub config: Option<PathBuf>,

    /// External build step to run, with its arguments
    #[clap(trailing_var_arg = true)]
    pub command: Vec<String>,
}

/// On-disk configuration. The schema is deliberately a single integer; build
/// behavior is not configured here.
#[derive(Deserialize, Debug, Default)]
pub struct ConfigFile {
    pub verbosity: Option<i32>,
}

impl AppConfig {
    pub fn new() -> Self {
        AppConfig::parse()
    }

    /// Verbosity to run with: the command line wins over the config file,
    /// which wins over the built-in default of 1.
    pub fn effective_verbosity(&self) -> Result<i32, Error> {
        if let Some(v) = self.verbosity {
            return Ok(v);
        }
        if let Some(file) = self.load_config_file()? {
            if let Some(v) = file.verbosity {
                log::debug!("verbosity {} from config file", v);
                return Ok(v);
            }
        }
        Ok(DEFAULT_VERBOSITY)
    }

    fn load_config_file(&self) -> Result<Option<ConfigFile>, Error> {
        let (path, required) = match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !path.exists() {
            if required {
                return Err(Error::Config(format!(
                    "config file {:?} does not exist",
                    path
                )));
            }
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        let parsed = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("failed to parse {:?}: {}", path, e)))?;
        Ok(Some(parsed))
    }
}
