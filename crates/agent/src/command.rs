//! Parsing of a single REPL input line.

/// What a line typed at the prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// `exit` or `quit`
    Exit,
    /// `clear`: start a fresh conversation
    Clear,
    /// `help` or `?`
    Help,
    /// Nothing but whitespace
    Empty,
    /// Anything else, trimmed, for the model
    Prompt(String),
}

impl ReplCommand {
    /// Control words match the whole trimmed line, ignoring case.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Self::Empty,
            "exit" | "quit" => Self::Exit,
            "clear" => Self::Clear,
            "help" | "?" => Self::Help,
            _ => Self::Prompt(trimmed.to_string()),
        }
    }
}

/// Command summary printed for `help`.
pub const HELP_LINES: &[(&str, &str)] = &[
    ("help, ?", "show this summary"),
    ("clear", "start a new conversation and empty the todo list"),
    ("exit, quit", "leave Calculus"),
];
