//! Shared styling helpers for CLI output.

use std::io::IsTerminal;

use benchsim_runtime::panel::Color;
use owo_colors::OwoColorize;

fn should_color() -> bool {
    std::io::stdout().is_terminal()
}

pub fn success(text: impl AsRef<str>) -> String {
    let text = text.as_ref();
    if should_color() {
        format!("{}", text.green())
    } else {
        text.to_string()
    }
}

pub fn error(text: impl AsRef<str>) -> String {
    let text = text.as_ref();
    if should_color() {
        format!("{}", text.red())
    } else {
        text.to_string()
    }
}

pub fn accent(text: impl AsRef<str>) -> String {
    let text = text.as_ref();
    if should_color() {
        format!("{}", text.cyan())
    } else {
        text.to_string()
    }
}

/// Color name rendered in the indicator's own color.
pub fn lamp(color: Color) -> String {
    let text = color.as_str();
    if !should_color() {
        return text.to_string();
    }
    match color {
        Color::Red => format!("{}", text.red().bold()),
        Color::Lime => format!("{}", text.bright_green().bold()),
        Color::White => format!("{}", text.dimmed()),
    }
}
