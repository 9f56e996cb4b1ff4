use std::path::PathBuf;

use super::ConfigError;
use crate::core::commands::home_dir;

pub const RC_FILE: &str = ".smallshrc";
pub const HISTORY_FILE: &str = ".smallsh_history";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub rc_path: PathBuf,
    pub history_path: PathBuf,
}

impl ConfigPaths {
    pub fn new() -> Result<Self, ConfigError> {
        let home = home_dir().ok_or(ConfigError::HomeDirNotFound)?;
        Ok(Self::under(home))
    }

    pub fn under(home: PathBuf) -> Self {
        ConfigPaths {
            rc_path: home.join(RC_FILE),
            history_path: home.join(HISTORY_FILE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_under_home() {
        let paths = ConfigPaths::under(PathBuf::from("/home/testuser"));

        assert_eq!(paths.rc_path, PathBuf::from("/home/testuser/.smallshrc"));
        assert_eq!(
            paths.history_path,
            PathBuf::from("/home/testuser/.smallsh_history")
        );
    }
}
