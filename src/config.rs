//! Runtime configuration from `CARDIORISK_*` environment variables.
//!
//! Configuration errors are fatal at startup. Artifact errors are not: they
//! are handled later by the degraded prediction service.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use ed25519_dalek::VerifyingKey;

use crate::adapters::artifacts::manifest::verifying_key_from_b64;
use crate::adapters::artifacts::VerifyOptions;

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_ARTIFACT_DIR: &str = "models";
const DEFAULT_LOG_FILE: &str = "cardiorisk.log";

/// Where formatted logs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMode {
    Stdout,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub artifact_dir: PathBuf,
    pub verifying_key: Option<VerifyingKey>,
    pub allow_unsigned: bool,
    pub strict_columns: bool,
    /// `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
    pub log_mode: LogMode,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns error if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    /// Returns error if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let flag = |name: &str| {
            var(name)
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
                .unwrap_or(false)
        };

        let bind_raw = var("CARDIORISK_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw
            .parse()
            .with_context(|| format!("CARDIORISK_BIND is not a socket address: {bind_raw:?}"))?;

        let artifact_dir = var("CARDIORISK_ARTIFACT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR));

        let verifying_key = if let Some(b64) = var("CARDIORISK_ARTIFACT_PUBKEY_B64") {
            Some(verifying_key_from_b64(&b64).context("CARDIORISK_ARTIFACT_PUBKEY_B64")?)
        } else if let Some(path) = var("CARDIORISK_ARTIFACT_PUBKEY_B64_FILE") {
            let b64 = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed reading verifying key file {path:?}"))?;
            Some(verifying_key_from_b64(&b64).context("CARDIORISK_ARTIFACT_PUBKEY_B64_FILE")?)
        } else {
            None
        };

        let cors_origins = var("CARDIORISK_CORS_ORIGINS").map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect()
        });

        let log_mode = match var("CARDIORISK_LOG_MODE").as_deref() {
            None | Some("stdout") => LogMode::Stdout,
            Some("file") => LogMode::File(
                var("CARDIORISK_LOG_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            ),
            Some(other) => anyhow::bail!("CARDIORISK_LOG_MODE must be stdout or file, got {other:?}"),
        };

        Ok(Self {
            bind,
            artifact_dir,
            verifying_key,
            allow_unsigned: flag("CARDIORISK_ALLOW_UNSIGNED_ARTIFACTS"),
            strict_columns: flag("CARDIORISK_STRICT_COLUMNS"),
            cors_origins,
            log_mode,
        })
    }

    #[must_use]
    pub fn verify_options(&self) -> VerifyOptions {
        VerifyOptions {
            verifying_key: self.verifying_key,
            allow_unsigned: self.allow_unsigned,
        }
    }
}
