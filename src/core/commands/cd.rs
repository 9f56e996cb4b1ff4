use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::CommandError;

/// Where `cd <path>` should go, given the current directory and home.
///
/// `.` and `..` pass through as-is, an empty path means home, anything else
/// is appended to `cwd` after a separator. A leading `/` in `path` is kept,
/// so `/tmp` from `/work` becomes `/work//tmp`.
pub fn resolve_target(path: &str, cwd: &Path, home: Option<PathBuf>) -> Result<PathBuf, CommandError> {
    match path {
        "." | ".." => Ok(PathBuf::from(path)),
        "" => home.ok_or(CommandError::HomeDirNotFound),
        _ => {
            let mut target = OsString::from(cwd.as_os_str());
            target.push("/");
            target.push(path);
            Ok(PathBuf::from(target))
        }
    }
}

/// `HOME`, falling back to the platform's idea of the home directory.
pub fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
}

/// Changes the working directory. On failure the directory is unchanged and
/// the error names the path as it was typed.
pub fn change_directory(path: &str) -> Result<PathBuf, CommandError> {
    let failed = |source| CommandError::ChangeDirectory {
        path: path.to_string(),
        source,
    };

    let cwd = env::current_dir().map_err(failed)?;
    let target = resolve_target(path, &cwd, home_dir())?;
    env::set_current_dir(&target).map_err(failed)?;

    env::current_dir().map_err(failed)
}
