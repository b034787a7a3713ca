// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "configs/featmon.yaml";
pub const DEFAULT_STORE_ROOT: &str = "data/featmon";

/// Explicit path wins, then `FEATMON_CONFIG_PATH`, then the workspace default.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    resolve_with_env(explicit, crate::ENV_FEATMON_CONFIG_PATH, DEFAULT_CONFIG_PATH)
}

#[must_use]
pub fn resolve_store_root(explicit: Option<&Path>) -> PathBuf {
    resolve_with_env(explicit, crate::ENV_FEATMON_STORE_ROOT, DEFAULT_STORE_ROOT)
}

fn resolve_with_env(explicit: Option<&Path>, env_key: &str, fallback: &str) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(value) = std::env::var(env_key) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    PathBuf::from(fallback)
}

#[cfg(test)]
mod tests {
    use super::resolve_config_path;
    use std::path::Path;

    #[test]
    fn explicit_path_takes_precedence() {
        let path = resolve_config_path(Some(Path::new("custom/featmon.yaml")));
        assert_eq!(path, Path::new("custom/featmon.yaml"));
    }
}
