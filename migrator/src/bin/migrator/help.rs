//! Coloured `--help` output: clap styles plus the examples and environment appendix.

use std::fmt::Write;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{ColorChoice, Command};
use colored::{Color, Colorize, control::ShouldColorize};

use crate::examples::{ExampleGroup, command_examples};
use crate::theme;

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("REDIS_URL", "Redis connection URL for the execution tracker and script data"),
    ("RUST_LOG", "Log filter for engine diagnostics (e.g. migrator=debug)"),
];

/// Renders help text, honouring `NO_COLOR`/`CLICOLOR` from the environment.
pub struct HelpRenderer {
    use_color: bool,
}

impl HelpRenderer {
    pub fn from_env() -> Self {
        Self {
            use_color: ShouldColorize::from_env().should_colorize(),
        }
    }

    /// Attach styles, the top-level appendix and per-command examples to `command`.
    pub fn decorate(&self, command: Command) -> Command {
        let mut command = command
            .styles(styles())
            .color(if self.use_color { ColorChoice::Auto } else { ColorChoice::Never })
            .after_long_help(self.appendix());

        for example in command_examples() {
            let text = self.examples(example.groups);
            command = command.mut_subcommand(example.name, |sub| sub.after_long_help(text));
        }
        command
    }

    fn paint(&self, text: &str, color: Color, bold: bool) -> String {
        match (self.use_color, bold) {
            (false, _) => text.to_string(),
            (true, true) => text.color(color).bold().to_string(),
            (true, false) => text.color(color).to_string(),
        }
    }

    fn examples(&self, groups: &[ExampleGroup]) -> String {
        let mut buffer = String::new();
        let _ = writeln!(buffer, "{}", self.paint("Examples:", theme::SECTION, true));

        for (index, group) in groups.iter().enumerate() {
            if index > 0 {
                buffer.push('\n');
            }
            let _ = writeln!(buffer, "  {}", self.paint(group.title, theme::HEADING, true));
            for command in group.commands {
                let _ = writeln!(
                    buffer,
                    "    {} {}",
                    self.paint(theme::ARROW, theme::COMMAND, false),
                    self.paint(command, theme::COMMAND, false)
                );
            }
        }
        buffer
    }

    fn appendix(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(buffer, "{}", self.paint("Environment Variables:", theme::SECTION, true));
        for (key, description) in ENVIRONMENT_VARIABLES {
            let _ = writeln!(
                buffer,
                "  {}  {}",
                self.paint(key, theme::KEY, true),
                self.paint(description, theme::VALUE, false)
            );
        }

        let _ = writeln!(
            buffer,
            "\n{} {}",
            self.paint("Tip:", theme::SECTION, true),
            self.paint("Use 'migrator <command> --help' to view examples for each command.", theme::COMMAND, false)
        );
        buffer
    }
}

fn styles() -> Styles {
    Styles::styled()
        .usage(AnsiColor::BrightBlue.on_default().bold())
        .header(AnsiColor::Cyan.on_default().bold())
        .literal(AnsiColor::Magenta.on_default())
        .placeholder(AnsiColor::BrightBlack.on_default())
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default().bold())
}
