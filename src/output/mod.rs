mod progress;
mod render;
mod styling;
mod tables;

pub use progress::Spinner;
pub use render::{render_overview, render_status};
pub use styling::{blue, green, red, yellow};

use console::Term;
use log::warn;

use crate::monitor::{Notice, Snapshot, StatusSink};

/// Writes rendered build state to stdout.
pub struct TerminalSink {
    term: Term,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for TerminalSink {
    fn render(&mut self, snapshot: &Snapshot) {
        println!("{}", render_status(snapshot));
    }

    fn clear(&mut self) {
        if let Err(e) = self.term.clear_screen() {
            warn!("Failed to clear terminal: {e}");
        }
    }

    fn notice(&mut self, notice: Notice) {
        match notice {
            Notice::Triggered => println!("{}\n", green("A build has been triggered.")),
            Notice::Cancelled => println!("\n{}", red("The build has been cancelled.")),
        }
    }
}

/// Prints a fatal message in red to stderr.
pub fn print_error(message: impl std::fmt::Display) {
    eprintln!("{}", red(message));
}
