use std::io::{self, Write};
use std::sync::Arc;

use nix::unistd::{getpid, Pid};
use tracing::{debug, warn};

mod executor;

use crate::{
    core::{
        commands::{CommandExecutor, Flow},
        config::{Config, ConfigLoader},
        state::ShellState,
    },
    error::ShellError,
    flags::Flags,
    highlight::SyntaxHighlighter,
    input::{EditorSource, LineSource, ReadOutcome},
    process::{claim_process_group, JobSignals, SignalCoordinator},
};

use executor::CommandHandler;

pub struct Shell {
    pub(crate) input: Box<dyn LineSource>,
    pub(crate) config: Config,
    pub(crate) flags: Flags,
    pub(crate) state: ShellState,
    pub(crate) executor: CommandExecutor,
    pub(crate) highlighter: SyntaxHighlighter,
}

impl Shell {
    pub fn new(flags: Flags) -> Result<Self, ShellError> {
        let config = Config::load(&flags)?;

        if let Err(e) = claim_process_group() {
            warn!("{}", e);
        }

        let (signals, completions) = JobSignals::new(getpid(), &config.prompt)?;
        let coordinator = SignalCoordinator::install(Arc::clone(&signals))?;
        let state = ShellState::new(signals, completions);

        let input = EditorSource::new(&config, flags.is_set("quiet"))?;

        Ok(Shell {
            input: Box::new(input),
            config,
            flags,
            state,
            executor: CommandExecutor::new(coordinator),
            highlighter: SyntaxHighlighter::new(),
        })
    }

    /// Runs the startup file, then the prompt loop, until `exit` or end of
    /// input. Both finish through the same teardown.
    pub fn run(&mut self) -> Result<(), ShellError> {
        let result = self.run_loop();
        self.input.finish();
        result
    }

    fn run_loop(&mut self) -> Result<(), ShellError> {
        if self.source_rc()? == Flow::Quit {
            return Ok(());
        }

        loop {
            self.flush_completions();

            match self.input.read_line(&self.config.prompt) {
                ReadOutcome::Line(line) => {
                    if self.execute_line(&line)? == Flow::Quit {
                        return Ok(());
                    }
                }
                ReadOutcome::Retry => continue,
                ReadOutcome::Eof => {
                    debug!("end of input");
                    self.executor.exit()?;
                    return Ok(());
                }
            }
        }
    }

    fn source_rc(&mut self) -> Result<Flow, ShellError> {
        let lines = match ConfigLoader::new(self.config.rc_path.as_deref()).rc_lines() {
            Ok(lines) => lines,
            Err(e) => {
                self.warn(&e.to_string());
                return Ok(Flow::Continue);
            }
        };

        for line in lines {
            if self.execute_line(&line)? == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Prints queued background completions, oldest first.
    fn flush_completions(&mut self) {
        let completions = self.state.take_completions();
        if completions.is_empty() {
            return;
        }

        let mut out = io::stdout().lock();
        for completion in completions {
            debug!(pid = completion.pid, report = %completion.report, "background reaped");
            self.executor.job_finished(Pid::from_raw(completion.pid));
            let _ = writeln!(out, "{}", completion);
        }
        let _ = out.flush();
    }

    pub(crate) fn report(&self, error: &ShellError) {
        let _ = io::stdout().flush();
        eprintln!("{}", self.highlighter.highlight_error(&error.to_string()));
    }

    pub(crate) fn warn(&self, message: &str) {
        if !self.flags.is_set("quiet") {
            eprintln!("Warning: {}", self.highlighter.highlight_warning(message));
        }
    }
}
