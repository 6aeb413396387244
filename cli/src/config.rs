use anyhow::{Context, Result};
use chrono::FixedOffset;
use directories::ProjectDirs;
use std::path::PathBuf;

use nibble_core::day::{parse_utc_offset, utc};

const DEFAULT_PORT: u16 = 2022;
const DEFAULT_BIND: &str = "127.0.0.1";

pub struct Config {
    pub db_path: PathBuf,
    pub utc_offset: FixedOffset,
    pub port: u16,
    pub bind: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "nibble").context("Could not determine home directory")?;

        Self::from_vars(proj_dirs.data_dir().to_path_buf(), |key| {
            std::env::var(key).ok()
        })
    }

    /// Build the config from a data directory and an environment lookup.
    ///
    /// Recognised variables: `NIBBLE_DB_PATH`, `NIBBLE_UTC_OFFSET`,
    /// `SERVER_PORT`, `SERVER_BIND`. Empty values count as unset.
    pub fn from_vars(data_dir: PathBuf, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let db_path = var("NIBBLE_DB_PATH").map_or_else(|| data_dir.join("nibble.db"), PathBuf::from);
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
        }

        let utc_offset = match var("NIBBLE_UTC_OFFSET") {
            Some(raw) => parse_utc_offset(&raw).context("Invalid NIBBLE_UTC_OFFSET")?,
            None => utc(),
        };

        let port = match var("SERVER_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid SERVER_PORT '{raw}'"))?,
            None => DEFAULT_PORT,
        };

        let bind = var("SERVER_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());

        Ok(Config {
            db_path,
            utc_offset,
            port,
            bind,
        })
    }
}
