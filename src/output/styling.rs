use console::{style, Color};

use crate::monitor::StatusColor;

/// Styling helpers for terminal output
pub fn cyan(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn bold(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bold()
}

pub fn green(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).green()
}

pub fn red(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).red()
}

pub fn yellow(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).yellow()
}

pub fn blue(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).blue()
}

pub fn status_color(color: StatusColor) -> Color {
    match color {
        StatusColor::Green => Color::Green,
        StatusColor::Yellow => Color::Yellow,
        StatusColor::Red => Color::Red,
        StatusColor::Blue => Color::Blue,
    }
}

pub fn in_status_color(
    text: impl std::fmt::Display,
    color: StatusColor,
) -> console::StyledObject<String> {
    style(text.to_string()).fg(status_color(color))
}
