use crate::parser::Command;

pub const EXIT: &str = "exit";
pub const CD: &str = "cd";
pub const STATUS: &str = "status";

/// Commands the shell runs itself instead of launching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builtin {
    /// Extra arguments are accepted and ignored.
    Exit,
    /// Empty path means "go home".
    ChangeDirectory(String),
    Status,
}

impl Builtin {
    /// Matches the program name exactly; anything else is external.
    pub fn resolve(command: &Command) -> Option<Self> {
        match command.program.as_str() {
            EXIT => Some(Builtin::Exit),
            CD => Some(Builtin::ChangeDirectory(
                command.first_arg().unwrap_or_default().to_string(),
            )),
            STATUS => Some(Builtin::Status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;

    fn resolve(line: &str) -> Option<Builtin> {
        Builtin::resolve(&parse_line(line, 1).unwrap().unwrap())
    }

    #[test]
    fn test_resolve_builtins() {
        assert_eq!(resolve("exit"), Some(Builtin::Exit));
        assert_eq!(resolve("exit now please"), Some(Builtin::Exit));
        assert_eq!(resolve("status"), Some(Builtin::Status));
        assert_eq!(resolve("status --verbose"), Some(Builtin::Status));
    }

    #[test]
    fn test_resolve_cd() {
        assert_eq!(
            resolve("cd /tmp"),
            Some(Builtin::ChangeDirectory("/tmp".to_string()))
        );
        assert_eq!(
            resolve("cd"),
            Some(Builtin::ChangeDirectory(String::new()))
        );
        assert_eq!(
            resolve("cd a b"),
            Some(Builtin::ChangeDirectory("a".to_string()))
        );
    }

    #[test]
    fn test_external_commands_are_not_builtins() {
        assert_eq!(resolve("ls -la"), None);
        assert_eq!(resolve("Exit"), None);
        assert_eq!(resolve("status2"), None);
    }
}
