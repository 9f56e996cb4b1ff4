//! Line acquisition. The shell only needs "one line, or try again, or end
//! of input"; everything about editing lives behind [`LineSource`].

mod editor;

pub use editor::EditorSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line, possibly empty, without its terminator.
    Line(String),
    /// The read was interrupted or failed transiently; ask again.
    Retry,
    Eof,
}

pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> ReadOutcome;

    /// Called once when the shell stops reading.
    fn finish(&mut self) {}
}
