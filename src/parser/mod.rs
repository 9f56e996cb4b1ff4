//! Line → tokens → [`Command`].

mod command;
mod tokenizer;

pub use command::{parse_tokens, Command, BACKGROUND, INPUT_REDIRECT, OUTPUT_REDIRECT};
pub use tokenizer::{expand_pid, tokenize, PID_MARKER};

use thiserror::Error;

pub const COMMENT_MARKER: char = '#';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("syntax error: expected a path after `{0}`")]
    MissingTarget(String),
}

/// Parses one line of input. Comment lines and blank lines produce `Ok(None)`.
pub fn parse_line(line: &str, pid: u32) -> Result<Option<Command>, ParseError> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.starts_with(COMMENT_MARKER) {
        return Ok(None);
    }

    parse_tokens(&tokenize(line, pid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_comment_lines_are_skipped() {
        assert_eq!(parse_line("# ls -la", 1).unwrap(), None);
        assert_eq!(parse_line("#", 1).unwrap(), None);
    }

    #[test]
    fn test_comment_marker_must_be_first() {
        let command = parse_line(" # not a comment", 1).unwrap().unwrap();
        assert_eq!(command.program, "#");
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert_eq!(parse_line("\n", 1).unwrap(), None);
        assert_eq!(parse_line("  \t \n", 1).unwrap(), None);
    }

    #[test]
    fn test_pid_expands_in_paths() {
        let command = parse_line("ls > out$$.txt\n", 321).unwrap().unwrap();
        assert_eq!(command.output, Some(PathBuf::from("out321.txt")));
    }
}
