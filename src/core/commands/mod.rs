use thiserror::Error;
use tracing::debug;

mod builtin;
mod cd;
mod status;

pub use builtin::Builtin;
pub use cd::{change_directory, home_dir};
pub use status::report_status;

use nix::unistd::Pid;

use crate::core::state::ShellState;
use crate::error::ShellError;
use crate::parser::Command;
use crate::process::{JobController, SignalCoordinator};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{path}: {source}")]
    ChangeDirectory {
        path: String,
        source: std::io::Error,
    },
    #[error("cd: home directory not found")]
    HomeDirNotFound,
}

/// What the prompt loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Runs a parsed [`Command`]: built-ins in-process, everything else through
/// the [`JobController`].
pub struct CommandExecutor {
    jobs: JobController,
    coordinator: SignalCoordinator,
}

impl CommandExecutor {
    pub fn new(coordinator: SignalCoordinator) -> Self {
        let jobs = JobController::new(coordinator.signals().clone());
        Self { jobs, coordinator }
    }

    pub fn execute(&mut self, command: &Command, state: &mut ShellState) -> Result<Flow, ShellError> {
        match Builtin::resolve(command) {
            Some(Builtin::Exit) => self.exit(),
            Some(Builtin::ChangeDirectory(path)) => {
                let landed = change_directory(&path)?;
                debug!(cwd = %landed.display(), "changed directory");
                Ok(Flow::Continue)
            }
            Some(Builtin::Status) => {
                println!("{}", report_status(state));
                Ok(Flow::Continue)
            }
            None => {
                self.jobs.launch_external(command, state)?;
                Ok(Flow::Continue)
            }
        }
    }

    /// A background job has been reported done; `exit` no longer signals it.
    pub fn job_finished(&mut self, pid: Pid) {
        self.jobs.forget(pid);
    }

    /// Terminates and reaps every child, then asks the loop to stop.
    pub fn exit(&mut self) -> Result<Flow, ShellError> {
        let quit = self.jobs.request_exit(&mut self.coordinator)?;
        Ok(if quit { Flow::Quit } else { Flow::Continue })
    }
}
