use mcpreg_core::RegistryError;
use std::path::{Path, PathBuf};

/// Resolve the registry checkout root.
///
/// Priority:
/// 1. `--root` flag / `MCPREG_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.git/`
///
/// Anything else is an error: artifacts are only ever written into a checkout.
pub fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf, RegistryError> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }

    let cwd = std::env::current_dir()?;
    find_checkout(&cwd).ok_or(RegistryError::NotARepository(cwd))
}

fn find_checkout(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(".git").is_dir() {
            return Some(dir);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => return None,
        }
    }
}
