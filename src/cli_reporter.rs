use colored::Colorize;

use super::reporter::{Report, Reporter};

/// Prints diagnostics to stdout/stderr with the phase and line folded
/// into the message, colorized the way a terminal user expects errors
/// and warnings to stand out.
pub struct CliReporter {
    errors_count: usize,
    warnings_count: usize,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            errors_count: 0,
            warnings_count: 0,
        }
    }

    pub fn had_error(&self) -> bool {
        self.errors_count > 0
    }

    /// Runtime failures use the reference's own wire format (message,
    /// then the originating line) rather than the generic `Report`
    /// layout used for compile-time diagnostics.
    pub fn runtime_error(&mut self, message: impl std::fmt::Display, line: u32) {
        self.errors_count += 1;
        eprintln!("{}\n[line {line}] in script", message.to_string().bright_red());
    }
}

impl Reporter for CliReporter {
    fn warning(&mut self, report: Report) {
        self.warnings_count += 1;
        println!("{} {}", "warning:".yellow().bold(), report);
    }

    fn error(&mut self, report: Report) {
        self.errors_count += 1;
        eprintln!(
            "{} {}",
            format!("{} error:", report.phase).bright_red().bold(),
            report
        );
    }
}
