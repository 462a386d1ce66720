//! Console sink implementation

use crate::core::{LogEntry, LogLevel, Result, Sink};
use colored::Colorize;

/// Writes one line per entry: `[HH:MM:SS] [LEVEL] message [source]`.
///
/// Error and Critical go to stderr, everything else to stdout.
pub struct ConsoleSink {
    use_colors: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn format_line(&self, entry: &LogEntry) -> String {
        let level_str = if self.use_colors {
            entry.level.to_str().color(entry.level.color_code()).to_string()
        } else {
            entry.level.to_str().to_string()
        };

        let mut line = format!(
            "[{}] [{}] {} [{}]",
            entry.timestamp.format("%H:%M:%S"),
            level_str,
            entry.text(),
            entry.source
        );

        let context = &entry.context;
        if let (true, Some(id)) = (context.has_customer_id(), &context.customer_id) {
            line.push_str(&format!(" customer={}", id));
        }
        if let (true, Some(id)) = (context.has_session_id(), &context.session_id) {
            line.push_str(&format!(" session={}", id));
        }

        line
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn accept(&self, entry: &LogEntry) -> Result<()> {
        let line = self.format_line(entry);

        match entry.level {
            LogLevel::Error | LogLevel::Critical => eprintln!("{}", line),
            _ => println!("{}", line),
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        use std::io::Write;
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
