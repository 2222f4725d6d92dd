use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "PatternLab";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming a directory with the four taxonomy tables.
pub const PATTERNS_DIR_ENV: &str = "PATTERNLAB_PATTERNS_DIR";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "patternlab=info"
}

/// Directory to load taxonomy tables from, if overridden.
/// `None` means the tables bundled into the binary are used.
pub fn patterns_dir() -> Option<PathBuf> {
    std::env::var(PATTERNS_DIR_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_patternlab() {
        assert_eq!(APP_NAME, "PatternLab");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_filter_targets_crate() {
        assert!(default_log_filter().starts_with("patternlab="));
    }
}
