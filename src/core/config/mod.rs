use std::env;
use std::path::PathBuf;

use thiserror::Error;

mod loader;
mod paths;

pub use loader::ConfigLoader;
pub use paths::ConfigPaths;

use crate::flags::Flags;

pub const DEFAULT_PROMPT: &str = ": ";
pub const DEFAULT_HISTORY_SIZE: usize = 1000;

pub const PROMPT_VAR: &str = "SMALLSH_PROMPT";
pub const HISTSIZE_VAR: &str = "SMALLSH_HISTSIZE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Home directory not found")]
    HomeDirNotFound,
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("cannot read {}: {source}", .path.display())]
    RcFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: String,
    pub history_size: usize,
    pub history_path: Option<PathBuf>,
    pub rc_path: Option<PathBuf>,
}

impl Config {
    /// Defaults, overridden by the environment, overridden by flags.
    pub fn load(flags: &Flags) -> Result<Self, ConfigError> {
        let paths = match ConfigPaths::new() {
            Ok(paths) => Some(paths),
            Err(e) => {
                tracing::warn!("{}; history and rc file disabled", e);
                None
            }
        };

        Self::from_sources(
            flags,
            paths,
            env::var(PROMPT_VAR).ok(),
            env::var(HISTSIZE_VAR).ok(),
        )
    }

    pub fn from_sources(
        flags: &Flags,
        paths: Option<ConfigPaths>,
        prompt: Option<String>,
        history_size: Option<String>,
    ) -> Result<Self, ConfigError> {
        let history_size = match history_size {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: HISTSIZE_VAR,
                value,
            })?,
            None => DEFAULT_HISTORY_SIZE,
        };

        let rc_path = if flags.is_set("norc") {
            None
        } else if let Some(path) = flags.get_value("config") {
            Some(PathBuf::from(path))
        } else {
            paths.as_ref().map(|p| p.rc_path.clone())
        };

        Ok(Config {
            prompt: prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            history_size,
            history_path: paths.map(|p| p.history_path),
            rc_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(args: &[&str]) -> Flags {
        let mut flags = Flags::new();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        flags.parse(&args).unwrap();
        flags
    }

    fn home() -> Option<ConfigPaths> {
        Some(ConfigPaths::under(PathBuf::from("/home/tester")))
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_sources(&flags(&[]), home(), None, None).unwrap();
        assert_eq!(config.prompt, ": ");
        assert_eq!(config.history_size, DEFAULT_HISTORY_SIZE);
        assert_eq!(
            config.rc_path,
            Some(PathBuf::from("/home/tester/.smallshrc"))
        );
        assert_eq!(
            config.history_path,
            Some(PathBuf::from("/home/tester/.smallsh_history"))
        );
    }

    #[test]
    fn test_environment_overrides() {
        let config = Config::from_sources(
            &flags(&[]),
            home(),
            Some("$ ".to_string()),
            Some("50".to_string()),
        )
        .unwrap();
        assert_eq!(config.prompt, "$ ");
        assert_eq!(config.history_size, 50);
    }

    #[test]
    fn test_bad_history_size() {
        let result = Config::from_sources(&flags(&[]), home(), None, Some("lots".to_string()));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: HISTSIZE_VAR, .. })
        ));
    }

    #[test]
    fn test_config_flag_and_norc() {
        let custom = Config::from_sources(&flags(&["-c", "/etc/smallshrc"]), home(), None, None)
            .unwrap();
        assert_eq!(custom.rc_path, Some(PathBuf::from("/etc/smallshrc")));

        let none = Config::from_sources(&flags(&["--norc"]), home(), None, None).unwrap();
        assert_eq!(none.rc_path, None);
    }

    #[test]
    fn test_without_home() {
        let config = Config::from_sources(&flags(&[]), None, None, None).unwrap();
        assert_eq!(config.rc_path, None);
        assert_eq!(config.history_path, None);
    }
}
