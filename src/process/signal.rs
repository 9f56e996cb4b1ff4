//! Signal plumbing for the shell process.
//!
//! Two asynchronous notifications matter:
//! - SIGTSTP flips foreground-only mode and prints a notice.
//! - SIGCHLD reaps one finished background child and queues a completion
//!   record for the prompt loop to print.
//!
//! Handlers only touch atomics and raw `write(2)`/`waitpid(2)`, so they are
//! safe to run at any point of the main loop.

use std::fmt;
use std::io::{self, Read};
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use nix::sys::signal::{sigaction, sigprocmask, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag};
use nix::unistd::{getpid, Pid};
use signal_hook::consts::{SIGCHLD, SIGTSTP};
use signal_hook::SigId;

use super::{ExitReport, ProcessError};

pub const ENTER_FOREGROUND_ONLY: &str = "\nEntering foreground-only mode (& is now ignored)\n";
pub const EXIT_FOREGROUND_ONLY: &str = "\nExiting foreground-only mode\n";

const NO_FOREGROUND: i32 = -1;

/// A background child that finished, as seen by the SIGCHLD handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub pid: i32,
    pub report: ExitReport,
}

impl Completion {
    const ENCODED_LEN: usize = 12;

    fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let (tag, value) = match self.report {
            ExitReport::Exited(code) => (0i32, code),
            ExitReport::Signaled(signal) => (1i32, signal),
        };

        let mut bytes = [0u8; Self::ENCODED_LEN];
        bytes[0..4].copy_from_slice(&self.pid.to_ne_bytes());
        bytes[4..8].copy_from_slice(&tag.to_ne_bytes());
        bytes[8..12].copy_from_slice(&value.to_ne_bytes());
        bytes
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        let word = |at: usize| -> Option<i32> {
            Some(i32::from_ne_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
        };

        let report = match word(4)? {
            0 => ExitReport::Exited(word(8)?),
            1 => ExitReport::Signaled(word(8)?),
            _ => return None,
        };
        Some(Completion { pid: word(0)?, report })
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "background pid {} is done: {}", self.pid, self.report)
    }
}

/// State shared between the prompt loop and the signal handlers.
///
/// The foreground pid and the mode flag are plain atomics. Completions go
/// through a non-blocking socket pair: the handler appends fixed-size
/// records with `write(2)` and the prompt loop drains them through
/// [`CompletionReceiver`].
#[derive(Debug)]
pub struct JobSignals {
    shell_pid: i32,
    foreground: AtomicI32,
    foreground_only: AtomicBool,
    completions: UnixStream,
    notice_fd: RawFd,
    // Notice plus prompt, built up front so the handler only writes.
    enter_notice: Box<[u8]>,
    exit_notice: Box<[u8]>,
}

impl JobSignals {
    /// `prompt` is reprinted after each mode notice, since the notice lands
    /// on top of a pending read.
    pub fn new(shell_pid: Pid, prompt: &str) -> Result<(Arc<Self>, CompletionReceiver), ProcessError> {
        Self::with_notice_fd(shell_pid, prompt, libc::STDOUT_FILENO)
    }

    /// Like [`JobSignals::new`], but mode notices go to `notice_fd`.
    pub fn with_notice_fd(
        shell_pid: Pid,
        prompt: &str,
        notice_fd: RawFd,
    ) -> Result<(Arc<Self>, CompletionReceiver), ProcessError> {
        let (writer, reader) = UnixStream::pair().map_err(ProcessError::Queue)?;
        writer.set_nonblocking(true).map_err(ProcessError::Queue)?;
        reader.set_nonblocking(true).map_err(ProcessError::Queue)?;

        let signals = JobSignals {
            shell_pid: shell_pid.as_raw(),
            foreground: AtomicI32::new(NO_FOREGROUND),
            foreground_only: AtomicBool::new(false),
            completions: writer,
            notice_fd,
            enter_notice: format!("{}{}", ENTER_FOREGROUND_ONLY, prompt).into_bytes().into(),
            exit_notice: format!("{}{}", EXIT_FOREGROUND_ONLY, prompt).into_bytes().into(),
        };
        let receiver = CompletionReceiver {
            reader,
            partial: Vec::new(),
        };
        Ok((Arc::new(signals), receiver))
    }

    pub fn shell_pid(&self) -> Pid {
        Pid::from_raw(self.shell_pid)
    }

    pub fn set_foreground(&self, pid: Pid) {
        self.foreground.store(pid.as_raw(), Ordering::SeqCst);
    }

    pub fn clear_foreground(&self) {
        self.foreground.store(NO_FOREGROUND, Ordering::SeqCst);
    }

    pub fn is_foreground_only(&self) -> bool {
        self.foreground_only.load(Ordering::SeqCst)
    }

    /// SIGTSTP body. Ignored in any process other than the shell itself,
    /// which matters between `fork` and `exec`.
    pub fn on_stop_toggle(&self) {
        if getpid().as_raw() != self.shell_pid {
            return;
        }

        let was_on = self.foreground_only.fetch_xor(true, Ordering::SeqCst);
        let notice = if was_on {
            &self.exit_notice
        } else {
            &self.enter_notice
        };
        // SAFETY: write(2) is async-signal-safe and `notice` lives as long
        // as `self`.
        unsafe {
            libc::write(self.notice_fd, notice.as_ptr().cast(), notice.len());
        }
    }

    /// SIGCHLD body. Reaps at most one finished child without blocking.
    /// The foreground child is left to the foreground wait.
    pub fn on_child_exit(&self) {
        let Ok(status) = waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) else {
            return;
        };
        let Some(pid) = status.pid() else {
            return;
        };
        if pid.as_raw() <= 0 || pid.as_raw() == self.foreground.load(Ordering::SeqCst) {
            return;
        }
        if let Some(report) = ExitReport::from_wait_status(status) {
            self.record_completion(Completion {
                pid: pid.as_raw(),
                report,
            });
        }
    }

    /// Appends one record. A full queue drops the record rather than block.
    fn record_completion(&self, completion: Completion) {
        let bytes = completion.encode();
        // SAFETY: write(2) is async-signal-safe and `bytes` outlives the call.
        unsafe {
            libc::write(
                self.completions.as_raw_fd(),
                bytes.as_ptr().cast(),
                bytes.len(),
            );
        }
    }
}

/// Main-loop end of the completion queue.
#[derive(Debug)]
pub struct CompletionReceiver {
    reader: UnixStream,
    partial: Vec<u8>,
}

impl CompletionReceiver {
    /// Everything queued since the last call, oldest first.
    pub fn drain(&mut self) -> Vec<Completion> {
        let mut buf = [0u8; Completion::ENCODED_LEN * 32];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => self.partial.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }

        let whole = self.partial.len() - self.partial.len() % Completion::ENCODED_LEN;
        let completions = self.partial[..whole]
            .chunks_exact(Completion::ENCODED_LEN)
            .filter_map(Completion::decode)
            .collect();
        self.partial.drain(..whole);
        completions
    }
}

pub(crate) fn set_disposition(signal: Signal, handler: SigHandler) -> nix::Result<()> {
    let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
    // SAFETY: only SigDfl/SigIgn are installed through here.
    unsafe { sigaction(signal, &action) }.map(|_| ())
}

fn job_signal_set() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGCHLD);
    set.add(Signal::SIGTSTP);
    set
}

/// Holds SIGCHLD and SIGTSTP pending until dropped.
#[derive(Debug)]
pub struct SignalDeferral {
    set: SigSet,
}

impl SignalDeferral {
    pub fn begin() -> Result<Self, ProcessError> {
        let set = job_signal_set();
        sigprocmask(SigmaskHow::SIG_BLOCK, Some(&set), None).map_err(ProcessError::Signal)?;
        Ok(SignalDeferral { set })
    }
}

impl Drop for SignalDeferral {
    fn drop(&mut self) {
        let _ = sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&self.set), None);
    }
}

/// Clears any mask inherited from the shell. Used in the new process only.
pub(crate) fn clear_signal_mask() -> nix::Result<()> {
    sigprocmask(SigmaskHow::SIG_SETMASK, Some(&SigSet::empty()), None)
}

/// Owns the SIGTSTP/SIGCHLD registrations for the shell's lifetime.
pub struct SignalCoordinator {
    signals: Arc<JobSignals>,
    stop_toggle: Option<SigId>,
    child_exit: Option<SigId>,
}

impl SignalCoordinator {
    /// The shell itself ignores SIGINT and SIGTERM; the handlers above are
    /// registered for SIGTSTP and SIGCHLD.
    pub fn install(signals: Arc<JobSignals>) -> Result<Self, ProcessError> {
        set_disposition(Signal::SIGINT, SigHandler::SigIgn).map_err(ProcessError::Signal)?;
        set_disposition(Signal::SIGTERM, SigHandler::SigIgn).map_err(ProcessError::Signal)?;

        let toggle = Arc::clone(&signals);
        // SAFETY: the closure only performs async-signal-safe operations.
        let stop_toggle = unsafe {
            signal_hook::low_level::register(SIGTSTP, move || toggle.on_stop_toggle())
        }
        .map_err(ProcessError::Install)?;

        let reaper = Arc::clone(&signals);
        // SAFETY: as above; waitpid(2) and write(2) are async-signal-safe.
        let child_exit = unsafe {
            signal_hook::low_level::register(SIGCHLD, move || reaper.on_child_exit())
        }
        .map_err(ProcessError::Install)?;

        tracing::debug!(shell_pid = signals.shell_pid, "signal handlers installed");

        Ok(SignalCoordinator {
            signals,
            stop_toggle: Some(stop_toggle),
            child_exit: Some(child_exit),
        })
    }

    pub fn signals(&self) -> &Arc<JobSignals> {
        &self.signals
    }

    /// Stops reacting to SIGCHLD. Children are then reaped by the kernel and
    /// by whoever calls `wait`.
    pub fn stop_child_notifications(&mut self) -> Result<(), ProcessError> {
        if let Some(id) = self.child_exit.take() {
            signal_hook::low_level::unregister(id);
        }
        set_disposition(Signal::SIGCHLD, SigHandler::SigIgn).map_err(ProcessError::Signal)
    }
}

impl Drop for SignalCoordinator {
    fn drop(&mut self) {
        for id in [self.stop_toggle.take(), self.child_exit.take()].into_iter().flatten() {
            signal_hook::low_level::unregister(id);
        }
    }
}
