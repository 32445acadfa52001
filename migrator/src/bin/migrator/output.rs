use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color as TableColor, Table, presets};
use migrator::{Phase, RunOutcome, StatusReporter};
use serde::Serialize;

use crate::theme::{self, Tone};

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
    /// Compact single-line output
    Compact,
}

/// Global CLI options that affect output and behavior
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Command results that render as a table or a single line.
pub trait TableDisplay {
    fn to_table(&self, options: &GlobalOptions) -> Table;
    fn to_compact(&self) -> String;
}

/// Where a status line goes, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    Stdout,
    Stderr,
    Nowhere,
}

#[derive(Clone, Debug)]
pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    /// Print a command result in the selected format.
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }

        let rendered = match self.options.output_format {
            OutputFormat::Json => serde_json::to_string_pretty(data)?,
            OutputFormat::Table => data.to_table(&self.options).to_string(),
            OutputFormat::Compact => data.to_compact(),
        };
        println!("{rendered}");
        Ok(())
    }

    /// Progress, headings and key/value lines are dropped in quiet and JSON modes.
    fn chatty(&self) -> bool {
        !self.options.quiet && self.options.output_format != OutputFormat::Json
    }

    fn sink(&self, tone: Tone) -> Sink {
        match tone {
            Tone::Error => Sink::Stderr,
            _ if self.options.quiet => Sink::Nowhere,
            Tone::Detail if self.options.verbose => Sink::Stderr,
            Tone::Detail => Sink::Nowhere,
            Tone::Progress | Tone::Skipped if !self.chatty() => Sink::Nowhere,
            _ => Sink::Stdout,
        }
    }

    fn paint(&self, text: &str, color: colored::Color) -> String {
        if self.options.no_color { text.to_string() } else { text.color(color).to_string() }
    }

    fn line(&self, tone: Tone, message: &str) -> String {
        format!("{} {}", self.paint(tone.icon(), tone.color()), self.paint(message, tone.color()))
    }

    /// Print an icon-prefixed status line.
    pub fn status(&self, tone: Tone, message: &str) {
        match self.sink(tone) {
            Sink::Stdout => println!("{}", self.line(tone, message)),
            Sink::Stderr => eprintln!("{}", self.line(tone, message)),
            Sink::Nowhere => {}
        }
    }

    pub fn success(&self, message: &str) {
        self.status(Tone::Success, message);
    }

    pub fn error(&self, message: &str) {
        self.status(Tone::Error, message);
    }

    pub fn warning(&self, message: &str) {
        self.status(Tone::Warning, message);
    }

    pub fn info(&self, message: &str) {
        self.status(Tone::Info, message);
    }

    /// Only shown with `--verbose`.
    pub fn verbose(&self, message: &str) {
        self.status(Tone::Detail, message);
    }

    pub fn heading(&self, text: &str) {
        if !self.chatty() {
            return;
        }
        if self.options.no_color {
            println!("\n{text}\n{}", "=".repeat(text.chars().count()));
        } else {
            println!("\n{}", text.color(theme::HEADING).bold());
        }
    }

    pub fn key_value(&self, key: &str, value: &str) {
        if !self.chatty() {
            return;
        }
        let key = if self.options.no_color { key.to_string() } else { key.color(theme::KEY).bold().to_string() };
        println!("  {key}: {}", self.paint(value, theme::VALUE));
    }

    pub fn bullet(&self, text: &str) {
        if self.chatty() {
            println!("  {} {text}", self.paint(theme::BULLET, theme::MUTED));
        }
    }

    /// Empty table with the bold header row; ASCII borders without colour.
    pub fn table(options: &GlobalOptions, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table.load_preset(if options.no_color { presets::ASCII_FULL } else { presets::UTF8_FULL_CONDENSED });
        table.set_header(headers.iter().map(|header| {
            let cell = Cell::new(header).add_attribute(Attribute::Bold);
            if options.no_color { cell } else { cell.fg(TableColor::Cyan) }
        }));
        table
    }
}

impl StatusReporter for OutputManager {
    fn phase(&self, _script: &str, phase: &Phase) {
        self.status(Tone::Progress, &phase.to_string());
    }

    fn finished(&self, _script: &str, outcome: &RunOutcome) {
        let tone = match outcome {
            RunOutcome::Completed(_) => Tone::Success,
            RunOutcome::Skipped => Tone::Skipped,
            RunOutcome::Failed(_) => Tone::Error,
        };
        // Completed runs are summarised by the run command's own output in JSON mode.
        if tone == Tone::Success && !self.chatty() {
            return;
        }
        self.status(tone, &outcome.message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(options: GlobalOptions) -> OutputManager {
        OutputManager::new(options)
    }

    #[test]
    fn errors_always_reach_stderr() {
        let quiet = manager(GlobalOptions {
            quiet: true,
            ..Default::default()
        });
        assert_eq!(quiet.sink(Tone::Error), Sink::Stderr);
        assert_eq!(quiet.sink(Tone::Success), Sink::Nowhere);
    }

    #[test]
    fn json_output_keeps_progress_off_stdout() {
        let json = manager(GlobalOptions {
            output_format: OutputFormat::Json,
            ..Default::default()
        });
        assert_eq!(json.sink(Tone::Progress), Sink::Nowhere);
        assert_eq!(json.sink(Tone::Skipped), Sink::Nowhere);
        assert_eq!(json.sink(Tone::Warning), Sink::Stdout);
    }

    #[test]
    fn detail_needs_verbose() {
        assert_eq!(manager(GlobalOptions::default()).sink(Tone::Detail), Sink::Nowhere);
        let verbose = manager(GlobalOptions {
            verbose: true,
            ..Default::default()
        });
        assert_eq!(verbose.sink(Tone::Detail), Sink::Stderr);
    }

    #[test]
    fn plain_lines_without_color() {
        let plain = manager(GlobalOptions {
            no_color: true,
            ..Default::default()
        });
        assert_eq!(plain.line(Tone::Success, "done"), "✓ done");
        assert_eq!(plain.line(Tone::Skipped, "The script has already been run!"), "↷ The script has already been run!");
    }

    #[test]
    fn table_has_header_row() {
        let table = OutputManager::table(&GlobalOptions::default(), &["Script", "Executed"]);
        let rendered = table.to_string();
        assert!(rendered.contains("Script"));
        assert!(rendered.contains("Executed"));
    }
}
