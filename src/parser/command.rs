use std::path::PathBuf;

use super::ParseError;

pub const INPUT_REDIRECT: &str = "<";
pub const OUTPUT_REDIRECT: &str = ">";
pub const BACKGROUND: &str = "&";

/// One parsed line, ready to be resolved as a built-in or launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub program: String,
    /// `argv[0]` is always `program`.
    pub argv: Vec<String>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub background: bool,
}

impl Command {
    /// The first real argument after the program name, if any.
    pub fn first_arg(&self) -> Option<&str> {
        self.argv.get(1).map(String::as_str)
    }
}

/// Classifies `tokens` into a [`Command`]. An empty slice yields `Ok(None)`.
///
/// `<` and `>` take the next token as their path wherever they appear after
/// the program name. `&` only means "background" as the very last token;
/// anywhere else it is an ordinary argument.
pub fn parse_tokens(tokens: &[String]) -> Result<Option<Command>, ParseError> {
    let Some((program, rest)) = tokens.split_first() else {
        return Ok(None);
    };

    let (rest, background) = match rest.split_last() {
        Some((last, init)) if last == BACKGROUND => (init, true),
        _ => (rest, false),
    };

    let mut command = Command {
        program: program.clone(),
        argv: vec![program.clone()],
        input: None,
        output: None,
        background,
    };

    let mut words = rest.iter();
    while let Some(word) = words.next() {
        match word.as_str() {
            INPUT_REDIRECT => {
                let path = words
                    .next()
                    .ok_or_else(|| ParseError::MissingTarget(INPUT_REDIRECT.to_string()))?;
                command.input = Some(PathBuf::from(path));
            }
            OUTPUT_REDIRECT => {
                let path = words
                    .next()
                    .ok_or_else(|| ParseError::MissingTarget(OUTPUT_REDIRECT.to_string()))?;
                command.output = Some(PathBuf::from(path));
            }
            _ => command.argv.push(word.clone()),
        }
    }

    Ok(Some(command))
}
