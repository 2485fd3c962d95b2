//! Configuration for the archive manager.

use std::path::PathBuf;

/// Settings controlling where the manager unpacks nested archives.
///
/// # Examples
///
/// ```
/// use apkanalyzer_core::ManagerConfig;
///
/// // Use the system temp directory
/// let config = ManagerConfig::default();
///
/// // Unpack under a dedicated scratch directory
/// let custom = ManagerConfig {
///     temp_root: Some("/var/tmp/apk-scratch".into()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Prefix of every temporary directory the manager creates.
    pub temp_prefix: String,

    /// Parent of the temporary directories (`None` = system temp dir).
    pub temp_root: Option<PathBuf>,
}

impl Default for ManagerConfig {
    /// Default values:
    /// - `temp_prefix`: `"apkanalyzer"`
    /// - `temp_root`: `None`
    fn default() -> Self {
        Self {
            temp_prefix: "apkanalyzer".to_string(),
            temp_root: None,
        }
    }
}

impl ManagerConfig {
    /// Directory under which temporary directories are created.
    pub fn temp_parent(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ManagerConfig::default();
        assert_eq!(config.temp_prefix, "apkanalyzer");
        assert!(config.temp_root.is_none());
        assert_eq!(config.temp_parent(), std::env::temp_dir());
    }

    #[test]
    fn test_custom_temp_root() {
        let config = ManagerConfig {
            temp_root: Some(PathBuf::from("/scratch")),
            ..Default::default()
        };
        assert_eq!(config.temp_parent(), PathBuf::from("/scratch"));
    }
}
