//! XDG Base Directory paths for wacc-diag.
//!
//! | Purpose | XDG Variable | Default | wacc-diag Path |
//! |---------|--------------|---------|----------------|
//! | Config | `$XDG_CONFIG_HOME` | `~/.config` | `$XDG_CONFIG_HOME/wacc-diag/config.toml` |
//! | Scratch input | `$XDG_CACHE_HOME` | `~/.cache` | `$XDG_CACHE_HOME/wacc-diag/scratch/` |

use std::path::PathBuf;

use directories::BaseDirs;

const APP_DIR: &str = "wacc-diag";

/// Get the config directory.
///
/// Uses `$XDG_CONFIG_HOME/wacc-diag` or falls back to `~/.config/wacc-diag`.
pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".config"))
        .join(APP_DIR)
}

/// Get the cache directory.
///
/// Uses `$XDG_CACHE_HOME/wacc-diag` or falls back to `~/.cache/wacc-diag`.
pub fn cache_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.cache_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".cache"))
        .join(APP_DIR)
}

/// The config file read by [`EngineConfig::load`](crate::config::EngineConfig::load).
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Where analyzer input files go when no scratch directory is configured.
pub fn scratch_dir() -> PathBuf {
    cache_dir().join("scratch")
}

/// Fallback home directory when BaseDirs fails.
fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_under_wacc_diag() {
        assert!(config_dir().ends_with(APP_DIR));
        assert!(cache_dir().ends_with(APP_DIR));
    }

    #[test]
    fn config_file_is_under_config_dir() {
        let file = config_file();
        assert!(file.starts_with(config_dir()));
        assert!(file.ends_with("config.toml"));
    }

    #[test]
    fn scratch_dir_is_under_cache_dir() {
        let scratch = scratch_dir();
        assert!(scratch.starts_with(cache_dir()));
        assert!(scratch.ends_with("scratch"));
    }
}
