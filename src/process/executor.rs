use std::ffi::CString;
use std::io::{self, Write};
use std::sync::Arc;

use nix::errno::Errno;
use nix::sys::signal::{kill, SigHandler, Signal};
use nix::sys::wait::{wait, waitpid};
use nix::unistd::{execvp, fork, getpgrp, getpid, ForkResult, Pid};
use tracing::debug;

use super::redirect::{plan_redirections, RedirectionRequest};
use super::signal::{clear_signal_mask, set_disposition, JobSignals, SignalCoordinator, SignalDeferral};
use super::{ExitReport, LaunchError, ProcessError};
use crate::core::state::ShellState;
use crate::error::ShellError;
use crate::parser::Command;

/// Everything the new process does between `fork` and `exec`.
///
/// Built in the shell before forking, so the child only has to walk it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: CString,
    pub argv: Vec<CString>,
    pub background: bool,
    /// SIGINT disposition for the new process.
    pub interrupt: SigHandler,
    pub redirections: Vec<RedirectionRequest>,
}

impl LaunchPlan {
    /// In foreground-only mode a trailing `&` is ignored.
    pub fn new(command: &Command, foreground_only: bool) -> Result<Self, LaunchError> {
        let background = command.background && !foreground_only;
        let to_c = |arg: &String| {
            CString::new(arg.as_bytes()).map_err(|_| LaunchError::InvalidArgument(arg.clone()))
        };

        Ok(LaunchPlan {
            program: to_c(&command.program)?,
            argv: command.argv.iter().map(to_c).collect::<Result<_, _>>()?,
            background,
            interrupt: if background {
                SigHandler::SigIgn
            } else {
                SigHandler::SigDfl
            },
            redirections: plan_redirections(command, background),
        })
    }

    /// Signal dispositions, mask and redirections for the new process.
    pub fn configure(&self) -> Result<(), LaunchError> {
        set_disposition(Signal::SIGTERM, SigHandler::SigDfl).map_err(LaunchError::Setup)?;
        set_disposition(Signal::SIGINT, self.interrupt).map_err(LaunchError::Setup)?;
        set_disposition(Signal::SIGTSTP, SigHandler::SigIgn).map_err(LaunchError::Setup)?;
        set_disposition(Signal::SIGCHLD, SigHandler::SigDfl).map_err(LaunchError::Setup)?;
        clear_signal_mask().map_err(LaunchError::Setup)?;

        for request in &self.redirections {
            request.apply()?;
        }
        Ok(())
    }

    /// Configures the current process and replaces its image. Only returns
    /// on failure.
    pub fn configure_and_exec(&self) -> LaunchError {
        if let Err(err) = self.configure() {
            return err;
        }
        match execvp(&self.program, &self.argv) {
            Ok(never) => match never {},
            Err(errno) => LaunchError::Exec {
                program: self.program.to_string_lossy().into_owned(),
                errno,
            },
        }
    }
}

/// Forks; the child runs `plan` and never returns from here.
fn spawn(plan: &LaunchPlan) -> Result<Pid, ProcessError> {
    // Unflushed output would otherwise be written twice.
    let _ = io::stdout().flush();

    // SAFETY: the shell is single-threaded, and the child only walks the
    // prepared plan before exec or _exit.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => Ok(child),
        Ok(ForkResult::Child) => {
            let err = plan.configure_and_exec();
            let _ = writeln!(io::stderr(), "{}", err);
            // SAFETY: leave without running the shell's exit hooks.
            unsafe { libc::_exit(1) }
        }
        Err(errno) => Err(ProcessError::Fork(errno)),
    }
}

/// Who gets SIGTERM on `exit`.
///
/// A group leader signals its whole group. Otherwise the group belongs to
/// whoever started the shell, so only the background jobs still on record
/// are signalled.
pub fn termination_targets(shell: Pid, group: Pid, background: &[Pid]) -> Vec<Pid> {
    if shell == group {
        vec![Pid::from_raw(-group.as_raw())]
    } else {
        background.to_vec()
    }
}

/// Launches external programs, owns the foreground wait and remembers
/// background jobs until their completion is reported.
pub struct JobController {
    signals: Arc<JobSignals>,
    background: Vec<Pid>,
}

impl JobController {
    pub fn new(signals: Arc<JobSignals>) -> Self {
        Self {
            signals,
            background: Vec::new(),
        }
    }

    pub fn forget(&mut self, pid: Pid) {
        self.background.retain(|&job| job != pid);
    }

    pub fn launch_external(&mut self, command: &Command, state: &mut ShellState) -> Result<(), ShellError> {
        let plan = LaunchPlan::new(command, self.signals.is_foreground_only())?;

        // SIGCHLD/SIGTSTP stay pending until the bookkeeping below is done,
        // so the handler can never reap the foreground child.
        let deferral = SignalDeferral::begin()?;
        let child = spawn(&plan)?;

        if plan.background {
            debug!(pid = child.as_raw(), program = %command.program, "background launch");
            println!("background pid is {}", child);
            let _ = io::stdout().flush();
            self.background.push(child);
            drop(deferral);
            return Ok(());
        }

        debug!(pid = child.as_raw(), program = %command.program, "foreground launch");
        let report = self.wait_foreground(child)?;
        state.set_last_status(report);
        if report.is_signaled() {
            println!("{}", report);
            let _ = io::stdout().flush();
        }
        drop(deferral);

        Ok(())
    }

    fn wait_foreground(&self, child: Pid) -> Result<ExitReport, ProcessError> {
        self.signals.set_foreground(child);
        let report = loop {
            match waitpid(child, None) {
                Ok(status) => {
                    if let Some(report) = ExitReport::from_wait_status(status) {
                        break Ok(report);
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(errno) => break Err(ProcessError::Wait(errno)),
            }
        };
        self.signals.clear_foreground();

        if let Ok(report) = &report {
            debug!(pid = child.as_raw(), %report, "foreground reaped");
        }
        report
    }

    /// Teardown for `exit`: stop handling SIGCHLD, SIGTERM the children
    /// (see [`termination_targets`]), then wait until no child is left.
    pub fn request_exit(&mut self, coordinator: &mut SignalCoordinator) -> Result<bool, ProcessError> {
        coordinator.stop_child_notifications()?;

        let group = getpgrp();
        for target in termination_targets(getpid(), group, &self.background) {
            debug!(target = target.as_raw(), "sending SIGTERM");
            match kill(target, Signal::SIGTERM) {
                // Already gone; nothing left to stop.
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(errno) => return Err(ProcessError::Kill(errno)),
            }
        }
        self.background.clear();

        loop {
            match wait() {
                Ok(_) | Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => break,
                Err(errno) => return Err(ProcessError::Wait(errno)),
            }
        }
        Ok(true)
    }
}
