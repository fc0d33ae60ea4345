use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use ini::{Ini, ParseOption};
use slog::FilterLevel;

use crate::logger::DEFAULT_LOG_LEVEL;

/// Settings that control how property blocks are read and logged.
#[derive(Debug, Default, Clone)]
pub struct ReaderConfig {
    pub log_level: LogLevel,
    /// Treat a payload that leaves declared bytes unread as a desync instead of skipping the
    /// remainder.
    pub strict_sizes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel(pub FilterLevel);

impl Default for LogLevel {
    fn default() -> Self {
        Self(DEFAULT_LOG_LEVEL)
    }
}

impl ReaderConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let ini = Ini::load_from_str_opt(
            &text,
            ParseOption {
                enabled_escape: false,
                enabled_quote: false,
            },
        )?;
        Ok(Self::from_ini(&ini))
    }

    /// Builds a configuration from the general section, using defaults for missing or
    /// unparseable keys.
    pub fn from_ini(ini: &Ini) -> Self {
        let section = ini.section(None::<String>);
        let log_level = section
            .and_then(|section| section.get(KEY_LOG_LEVEL))
            .and_then(|value| FilterLevel::from_str(value.trim()).ok())
            .map(LogLevel)
            .unwrap_or_default();
        let strict_sizes = section
            .and_then(|section| section.get(KEY_STRICT_SIZES))
            .and_then(parse_bool)
            .unwrap_or_default();

        Self {
            log_level,
            strict_sizes,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

const KEY_LOG_LEVEL: &str = "LogLevel";
const KEY_STRICT_SIZES: &str = "StrictSizes";
