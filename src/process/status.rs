use std::fmt;

use nix::sys::wait::WaitStatus;

/// How a child process finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReport {
    Exited(i32),
    Signaled(i32),
}

impl Default for ExitReport {
    fn default() -> Self {
        ExitReport::Exited(0)
    }
}

impl ExitReport {
    /// Stopped/continued/still-alive statuses are not completions.
    pub fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(ExitReport::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(ExitReport::Signaled(signal as i32)),
            _ => None,
        }
    }

    pub fn is_signaled(&self) -> bool {
        matches!(self, ExitReport::Signaled(_))
    }
}

impl fmt::Display for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReport::Exited(code) => write!(f, "exit value {}", code),
            ExitReport::Signaled(signal) => write!(f, "terminated by signal {}", signal),
        }
    }
}
