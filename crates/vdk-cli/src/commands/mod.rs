//! Command handlers for the vdk binary.
//!
//! Flag/env resolution shared by multiple command paths lives here.
//! Command-specific logic lives in the submodules.

pub mod drift;
pub mod forecast;
pub mod merge;
pub mod replay;

use anyhow::Result;
use std::path::PathBuf;

pub const ENV_DATA_DIR: &str = "VITALDESK_DATA_DIR";
pub const ENV_MERGED_PATH: &str = "VITALDESK_MERGED_PATH";
pub const ENV_RANGES_PATH: &str = "VITALDESK_RANGES_PATH";
pub const ENV_ARTIFACTS_DIR: &str = "VITALDESK_ARTIFACTS_DIR";

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Resolve a required path from a flag or an env var; the flag wins.
pub fn path_from_flag_or_env(flag: Option<PathBuf>, flag_name: &str, env_var: &str) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    match env_path(env_var) {
        Some(path) => Ok(path),
        None => anyhow::bail!("missing path: pass {flag_name} or set {env_var}"),
    }
}

/// Resolve an optional path from a flag or an env var; the flag wins.
pub fn optional_path_from_flag_or_env(flag: Option<PathBuf>, env_var: &str) -> Option<PathBuf> {
    flag.or_else(|| env_path(env_var))
}

fn env_path(env_var: &str) -> Option<PathBuf> {
    std::env::var(env_var)
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .map(PathBuf::from)
}
