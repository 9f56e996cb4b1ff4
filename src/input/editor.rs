use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

use super::{LineSource, ReadOutcome};
use crate::core::config::Config;
use crate::error::ShellError;

/// Consecutive hard read failures tolerated before treating input as gone.
const MAX_READ_FAILURES: u32 = 16;

/// rustyline-backed [`LineSource`] with persistent history.
pub struct EditorSource {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
    quiet: bool,
    failures: u32,
}

impl EditorSource {
    pub fn new(config: &Config, quiet: bool) -> Result<Self, ShellError> {
        let editor_config = rustyline::Config::builder()
            .max_history_size(config.history_size)?
            .auto_add_history(true)
            .build();
        let mut editor = DefaultEditor::with_config(editor_config)?;

        if let Some(path) = config.history_path.as_ref().filter(|path| path.exists()) {
            if let Err(e) = editor.load_history(path) {
                if !quiet {
                    warn!("Couldn't load history from {}: {}", path.display(), e);
                }
            }
        }

        Ok(EditorSource {
            editor,
            history_path: config.history_path.clone(),
            quiet,
            failures: 0,
        })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> ReadOutcome {
        match self.editor.readline(prompt) {
            Ok(line) => {
                self.failures = 0;
                ReadOutcome::Line(line)
            }
            Err(ReadlineError::Eof) => ReadOutcome::Eof,
            Err(ReadlineError::Interrupted) => ReadOutcome::Retry,
            Err(ReadlineError::Io(e)) if e.kind() == std::io::ErrorKind::Interrupted => {
                ReadOutcome::Retry
            }
            Err(e) => {
                self.failures += 1;
                if !self.quiet {
                    warn!("read failed: {}", e);
                }
                if self.failures >= MAX_READ_FAILURES {
                    ReadOutcome::Eof
                } else {
                    ReadOutcome::Retry
                }
            }
        }
    }

    fn finish(&mut self) {
        let Some(path) = &self.history_path else {
            return;
        };
        if let Err(e) = self.editor.save_history(path) {
            if !self.quiet {
                warn!("Couldn't save history to {}: {}", path.display(), e);
            }
        }
    }
}
