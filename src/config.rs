// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::requeue::{ERROR_REQUEUE_SECS, RECONCILE_INTERVAL_SECS};
use anyhow::{bail, Context, Result};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

/// Controller configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Delay between successful passes of the same policy
    pub reconcile_interval: Duration,
    /// Delay before retrying a pass that failed with a transient error
    pub error_requeue: Duration,
    /// Log verbosity requested through LOG_LEVEL
    pub log_level: LogLevel,
    /// Set when LOG_LEVEL held an unrecognized value and INFO was used instead
    pub invalid_log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(RECONCILE_INTERVAL_SECS),
            error_requeue: Duration::from_secs(ERROR_REQUEUE_SECS),
            log_level: LogLevel::Info,
            invalid_log_level: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let reconcile_interval = match lookup("RECONCILE_INTERVAL_SECS") {
            Some(v) => parse_secs("RECONCILE_INTERVAL_SECS", &v)?,
            None => Duration::from_secs(RECONCILE_INTERVAL_SECS),
        };
        let error_requeue = match lookup("ERROR_REQUEUE_SECS") {
            Some(v) => parse_secs("ERROR_REQUEUE_SECS", &v)?,
            None => Duration::from_secs(ERROR_REQUEUE_SECS),
        };

        let (log_level, invalid_log_level) = match lookup("LOG_LEVEL") {
            Some(v) if !v.is_empty() => match v.parse::<LogLevel>() {
                Ok(level) => (level, None),
                Err(_) => (LogLevel::Info, Some(v)),
            },
            _ => (LogLevel::Info, None),
        };

        Ok(Config {
            reconcile_interval,
            error_requeue,
            log_level,
            invalid_log_level,
        })
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    let secs: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{} must be a whole number of seconds, got '{}'", key, value))?;
    if secs == 0 {
        bail!("{} must be greater than zero", key);
    }
    Ok(Duration::from_secs(secs))
}

/// Log levels accepted in LOG_LEVEL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub const SUPPORTED: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }

    /// Comma separated list of accepted values, for error messages
    pub fn supported() -> String {
        Self::SUPPORTED
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(s.to_string()),
        }
    }
}
