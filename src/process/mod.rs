use std::io::IsTerminal;
use std::path::PathBuf;

use nix::errno::Errno;
use nix::unistd::{getpgrp, getpid, setpgid, Pid};
use thiserror::Error;

pub mod executor;
pub mod redirect;
pub mod signal;
mod status;

pub use executor::{termination_targets, JobController, LaunchPlan};
pub use redirect::{OpenMode, RedirectionRequest};
pub use signal::{Completion, CompletionReceiver, JobSignals, SignalCoordinator, SignalDeferral};
pub use status::ExitReport;

/// Failures in the shell process itself.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("fork failed: {0}")]
    Fork(Errno),
    #[error("wait failed: {0}")]
    Wait(Errno),
    #[error("signal setup failed: {0}")]
    Signal(Errno),
    #[error("cannot register signal handler: {0}")]
    Install(std::io::Error),
    #[error("cannot create completion queue: {0}")]
    Queue(std::io::Error),
    #[error("cannot signal process group: {0}")]
    Kill(Errno),
    #[error("cannot create process group: {0}")]
    ProcessGroup(Errno),
}

/// Failures while preparing or replacing the new process image. Everything
/// except `InvalidArgument` happens after `fork`, in the child.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("cannot open {} for input", .path.display())]
    OpenInput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot open {} for output", .path.display())]
    OpenOutput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot open null device: {0}")]
    NullDevice(std::io::Error),
    #[error("cannot redirect descriptor {fd}: {errno}")]
    Redirect { fd: i32, errno: Errno },
    #[error("{program}: {}", .errno.desc())]
    Exec { program: String, errno: Errno },
    #[error("child setup failed: {0}")]
    Setup(Errno),
    #[error("argument contains a NUL byte: {0:?}")]
    InvalidArgument(String),
}

/// Makes the shell lead its own process group when it was started by a
/// non-interactive parent, so the exit broadcast stays among our children.
pub fn claim_process_group() -> Result<(), ProcessError> {
    let pid = getpid();
    if getpgrp() == pid || std::io::stdin().is_terminal() {
        return Ok(());
    }

    setpgid(Pid::from_raw(0), Pid::from_raw(0)).map_err(ProcessError::ProcessGroup)?;
    tracing::debug!(pgid = pid.as_raw(), "created own process group");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_error_messages() {
        let input = LaunchError::OpenInput {
            path: PathBuf::from("missing.txt"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(input.to_string(), "cannot open missing.txt for input");

        let output = LaunchError::OpenOutput {
            path: PathBuf::from("/nope/out.txt"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(output.to_string(), "cannot open /nope/out.txt for output");

        let exec = LaunchError::Exec {
            program: "badcmd".to_string(),
            errno: Errno::ENOENT,
        };
        assert_eq!(exec.to_string(), "badcmd: No such file or directory");
    }
}
