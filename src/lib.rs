//! smallsh: a small interactive shell.
//!
//! Reads one line at a time, runs `exit`, `cd` and `status` itself, and
//! launches everything else with optional `<`/`>` redirection, in the
//! foreground or, with a trailing `&`, in the background. SIGTSTP toggles
//! foreground-only mode; finished background jobs are reported before the
//! next prompt.

pub mod error;
pub mod flags;
pub mod shell;

pub mod core;
pub mod highlight;
pub mod input;
pub mod parser;
pub mod process;
