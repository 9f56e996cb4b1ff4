use tracing::debug;

use crate::core::commands::Flow;
use crate::error::ShellError;
use crate::parser::parse_line;

pub(crate) trait CommandHandler {
    fn execute_line(&mut self, line: &str) -> Result<Flow, ShellError>;
}

impl CommandHandler for super::Shell {
    /// Parses and runs one line. Errors are reported here and the loop goes
    /// on; only a failed fork is passed up.
    fn execute_line(&mut self, line: &str) -> Result<Flow, ShellError> {
        let pid = self.state.pid().as_raw().unsigned_abs();

        let command = match parse_line(line, pid) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(e) => {
                self.report(&e.into());
                return Ok(Flow::Continue);
            }
        };
        debug!(?command, "parsed");

        match self.executor.execute(&command, &mut self.state) {
            Ok(flow) => Ok(flow),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                self.report(&e);
                Ok(Flow::Continue)
            }
        }
    }
}
