use std::{fs, path::Path};

use super::ConfigError;

/// Reads the startup rc file. Each line is later run exactly as if it had
/// been typed at the prompt.
pub struct ConfigLoader<'a> {
    rc_path: Option<&'a Path>,
}

impl<'a> ConfigLoader<'a> {
    pub fn new(rc_path: Option<&'a Path>) -> Self {
        Self { rc_path }
    }

    pub fn rc_lines(&self) -> Result<Vec<String>, ConfigError> {
        match self.rc_path {
            Some(path) => Self::lines_if_exists(path),
            None => Ok(Vec::new()),
        }
    }

    fn lines_if_exists(path: &Path) -> Result<Vec<String>, ConfigError> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::RcFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(content.lines().map(String::from).collect())
    }
}
