//! Resolution of the server home directory.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

#[cfg(target_os = "windows")]
const BASE_ENV: &str = "APPDATA";
#[cfg(not(target_os = "windows"))]
const BASE_ENV: &str = "HOME";

/// Resolve the home directory into an absolute path.
///
/// - `None` → `<base>/<default_subdir>` where base is `%APPDATA%` on Windows, `$HOME` elsewhere
/// - `~` or `~/...` → expanded against the same base
/// - relative paths → joined with the current working directory
///
/// When `create` is set the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let path = match configured {
        None => base_dir()?.join(default_subdir),
        Some(raw) => expand(&raw)?,
    };

    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .context("cannot read current directory")?
            .join(path)
    };

    if create {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("cannot create home dir {}", path.display()))?;
    }
    Ok(path)
}

fn base_dir() -> Result<PathBuf> {
    match std::env::var_os(BASE_ENV) {
        Some(v) if !v.is_empty() => Ok(PathBuf::from(v)),
        _ => bail!("{BASE_ENV} is not set; configure server.home_dir explicitly"),
    }
}

fn expand(raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return base_dir();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(base_dir()?.join(rest));
    }
    Ok(PathBuf::from(raw))
}
