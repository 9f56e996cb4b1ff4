use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use nix::unistd::dup2;

use super::LaunchError;
use crate::parser::Command;

pub const NULL_DEVICE: &str = "/dev/null";

const STDIN: RawFd = libc::STDIN_FILENO;
const STDOUT: RawFd = libc::STDOUT_FILENO;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only; the file must already exist.
    Read,
    /// Write-only; created if absent, truncated if present.
    WriteTruncate,
    /// Read-write on an existing file. Used for the null device.
    ReadWrite,
}

/// Binds `target` to descriptor `fd` in the new process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectionRequest {
    pub fd: RawFd,
    pub target: PathBuf,
    pub mode: OpenMode,
}

impl RedirectionRequest {
    pub fn input(path: &Path) -> Self {
        RedirectionRequest {
            fd: STDIN,
            target: path.to_path_buf(),
            mode: OpenMode::Read,
        }
    }

    pub fn output(path: &Path) -> Self {
        RedirectionRequest {
            fd: STDOUT,
            target: path.to_path_buf(),
            mode: OpenMode::WriteTruncate,
        }
    }

    pub fn null(fd: RawFd) -> Self {
        RedirectionRequest {
            fd,
            target: PathBuf::from(NULL_DEVICE),
            mode: OpenMode::ReadWrite,
        }
    }

    /// Opens the target without touching any standard descriptor.
    pub fn open(&self) -> Result<File, LaunchError> {
        let mut options = OpenOptions::new();
        match self.mode {
            OpenMode::Read => options.read(true),
            OpenMode::WriteTruncate => options.write(true).create(true).truncate(true).mode(0o644),
            OpenMode::ReadWrite => options.read(true).write(true),
        };
        options.open(&self.target).map_err(|source| self.open_error(source))
    }

    /// Opens the target and installs it on `self.fd`.
    pub fn apply(&self) -> Result<(), LaunchError> {
        let file = self.open()?;
        if file.as_raw_fd() != self.fd {
            dup2(file.as_raw_fd(), self.fd).map_err(|errno| LaunchError::Redirect {
                fd: self.fd,
                errno,
            })?;
        } else {
            // Already sitting on the right descriptor; keep it open.
            std::mem::forget(file);
        }
        Ok(())
    }

    fn open_error(&self, source: io::Error) -> LaunchError {
        match self.mode {
            OpenMode::Read => LaunchError::OpenInput {
                path: self.target.clone(),
                source,
            },
            OpenMode::WriteTruncate => LaunchError::OpenOutput {
                path: self.target.clone(),
                source,
            },
            OpenMode::ReadWrite => LaunchError::NullDevice(source),
        }
    }
}

/// Redirections for `command`, in the order they must be applied.
///
/// Background jobs get the null device on stdin and stdout first so that
/// explicit `<`/`>` still win.
pub fn plan_redirections(command: &Command, background: bool) -> Vec<RedirectionRequest> {
    let mut requests = Vec::new();
    if background {
        requests.push(RedirectionRequest::null(STDIN));
        requests.push(RedirectionRequest::null(STDOUT));
    }
    if let Some(path) = &command.input {
        requests.push(RedirectionRequest::input(path));
    }
    if let Some(path) = &command.output {
        requests.push(RedirectionRequest::output(path));
    }
    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;
    use std::fs;
    use std::io::Read;

    fn command(line: &str) -> Command {
        parse_line(line, 1).unwrap().unwrap()
    }

    #[test]
    fn test_foreground_plan_has_only_explicit_redirects() {
        let requests = plan_redirections(&command("sort < in.txt > out.txt"), false);
        assert_eq!(
            requests,
            vec![
                RedirectionRequest::input(Path::new("in.txt")),
                RedirectionRequest::output(Path::new("out.txt")),
            ]
        );
    }

    #[test]
    fn test_background_plan_nulls_before_explicit() {
        let requests = plan_redirections(&command("sort > out.txt &"), true);
        assert_eq!(
            requests,
            vec![
                RedirectionRequest::null(STDIN),
                RedirectionRequest::null(STDOUT),
                RedirectionRequest::output(Path::new("out.txt")),
            ]
        );
    }

    #[test]
    fn test_no_redirects() {
        assert!(plan_redirections(&command("ls -la"), false).is_empty());
    }

    #[test]
    fn test_missing_input_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");

        let err = RedirectionRequest::input(&missing).open().unwrap_err();
        assert!(matches!(err, LaunchError::OpenInput { ref path, .. } if path == &missing));
        assert_eq!(
            err.to_string(),
            format!("cannot open {} for input", missing.display())
        );
    }

    #[test]
    fn test_output_is_created_then_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");

        let request = RedirectionRequest::output(&target);
        drop(request.open().unwrap());
        assert!(target.exists());

        fs::write(&target, "stale contents").unwrap();
        drop(request.open().unwrap());
        assert_eq!(fs::read_to_string(&target).unwrap(), "");
    }

    #[test]
    fn test_output_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("no/such/dir/out.txt");

        let err = RedirectionRequest::output(&target).open().unwrap_err();
        assert!(matches!(err, LaunchError::OpenOutput { .. }));
    }

    #[test]
    fn test_null_device_reads_empty() {
        let mut file = RedirectionRequest::null(STDIN).open().unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        assert!(contents.is_empty());
    }
}
