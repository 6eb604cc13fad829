//! Terminal decoration: the welcome box, colours, and screen control.

use std::path::Path;

use calculus_agent::HELP_LINES;

/// Box width including borders.
const BOX_WIDTH: usize = 62;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const ITALIC: &str = "\x1b[3m";
pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";
pub const GREY: &str = "\x1b[38;5;244m";
pub const LAVENDER: &str = "\x1b[38;5;183m";

/// Clear the screen and move the cursor home.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Remove SGR colour sequences so widths can be measured.
pub fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn box_line(content: &str) -> String {
    let visible = strip_ansi(content).chars().count();
    let pad = (BOX_WIDTH - 2).saturating_sub(visible);
    format!("{GREY}│{RESET}{content}{}{GREY}│{RESET}", " ".repeat(pad))
}

pub fn welcome_box(cwd: &Path) -> Vec<String> {
    vec![
        format!("{GREY}╭{}╮{RESET}", "─".repeat(BOX_WIDTH - 2)),
        box_line(&format!("  {LAVENDER}*{RESET} {BOLD}Welcome to Calculus!{RESET}")),
        box_line(""),
        box_line(&format!("  {ITALIC}Commands: help, clear, quit{RESET}")),
        box_line(""),
        box_line(&format!("  cwd: {GREY}{}{RESET}", cwd.display())),
        format!("{GREY}╰{}╯{RESET}", "─".repeat(BOX_WIDTH - 2)),
        String::new(),
    ]
}

pub fn help_text() -> Vec<String> {
    let mut lines = vec![format!("{BOLD}Commands{RESET}")];
    for (keys, what) in HELP_LINES {
        lines.push(format!("  {keys:<12} {GREY}{what}{RESET}"));
    }
    lines.push(format!("  {:<12} {GREY}anything else is sent to the assistant{RESET}", ""));
    lines
}
