use std::sync::Arc;

use nix::unistd::Pid;

use crate::process::{Completion, CompletionReceiver, ExitReport, JobSignals};

/// Shell-wide state, owned by the prompt loop.
///
/// The parts the signal handlers touch (foreground pid, foreground-only flag,
/// completion queue) live in the shared [`JobSignals`]; the last foreground
/// status is only ever written by the prompt loop.
pub struct ShellState {
    signals: Arc<JobSignals>,
    completions: CompletionReceiver,
    last_status: ExitReport,
}

impl ShellState {
    pub fn new(signals: Arc<JobSignals>, completions: CompletionReceiver) -> Self {
        Self {
            signals,
            completions,
            last_status: ExitReport::default(),
        }
    }

    pub fn pid(&self) -> Pid {
        self.signals.shell_pid()
    }

    pub fn last_status(&self) -> ExitReport {
        self.last_status
    }

    pub fn set_last_status(&mut self, report: ExitReport) {
        self.last_status = report;
    }

    /// Background completions queued since the last call.
    pub fn take_completions(&mut self) -> Vec<Completion> {
        self.completions.drain()
    }
}
