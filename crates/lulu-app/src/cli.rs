//! CLI argument definitions for the Lulu assistant.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Lulu: a sales-operations chat assistant backed by a local language model.
#[derive(Parser, Debug)]
#[command(name = "lulu", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Path to the shop directory JSON file.
    #[arg(short = 'd', long = "directory")]
    pub directory: Option<PathBuf>,

    /// Model backend: "ollama" or "scripted".
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<String>,

    /// Model name to request from the backend.
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Directory conversation exports are written to.
    #[arg(short = 'e', long = "export-dir")]
    pub export_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > LULU_CONFIG env var > platform default (~/.lulu/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("LULU_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log filter.
    ///
    /// Priority: --log-level flag > LULU_LOG env var > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if let Ok(level) = std::env::var("LULU_LOG") {
            if !level.trim().is_empty() {
                return level;
            }
        }
        config_level.to_string()
    }

    /// Resolve the shop directory path.
    ///
    /// Priority: --directory flag > config file value.
    pub fn resolve_directory(&self, config_path: &str) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(config_path))
    }

    /// Resolve the export directory.
    ///
    /// Priority: --export-dir flag > `export.dir` resolved under the data dir.
    pub fn resolve_export_dir(&self, data_dir: &str, export_dir: &str) -> PathBuf {
        if let Some(ref p) = self.export_dir {
            return p.clone();
        }
        let export = PathBuf::from(export_dir);
        if export.is_absolute() {
            export
        } else {
            expand_home(data_dir).join(export)
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    expand_home("~/.lulu/config.toml")
}
