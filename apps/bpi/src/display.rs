//! Output rendering and formatting

use bpi_install::InstallOutcome;
use bpi_state::Buildpack;
use bpi_types::{display_stack, ColorChoice, InstallAction};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use serde::Serialize;
use std::io;
use std::path::PathBuf;

/// One executed plan of an install batch
#[derive(Debug, Serialize)]
pub struct InstallSummary {
    pub name: String,
    pub filename: String,
    pub action: InstallAction,
    #[serde(flatten)]
    pub outcome: InstallOutcome,
}

/// Result of a CLI command
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CommandResult {
    Installed(Vec<InstallSummary>),
    Buildpacks(Vec<Buildpack>),
    Stack { file: PathBuf, stack: Option<String> },
}

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    json_output: bool,
    color_choice: ColorChoice,
    term: Term,
}

impl OutputRenderer {
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render a command result
    pub fn render_result(&self, result: &CommandResult) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        match result {
            CommandResult::Installed(summaries) => self.render_install_report(summaries),
            CommandResult::Buildpacks(buildpacks) => self.render_buildpack_list(buildpacks),
            CommandResult::Stack { file, stack } => {
                println!("{}: {}", file.display(), display_stack(stack.as_deref()));
                Ok(())
            }
        }
    }

    fn render_buildpack_list(&self, buildpacks: &[Buildpack]) -> io::Result<()> {
        if buildpacks.is_empty() {
            println!("No buildpacks installed.");
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Position").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Stack").add_attribute(Attribute::Bold),
            Cell::new("Enabled").add_attribute(Attribute::Bold),
            Cell::new("Locked").add_attribute(Attribute::Bold),
            Cell::new("Filename").add_attribute(Attribute::Bold),
        ]);

        for buildpack in buildpacks {
            table.add_row(vec![
                Cell::new(buildpack.position),
                Cell::new(&buildpack.name),
                Cell::new(display_stack(buildpack.stack.as_deref())),
                self.flag_cell(buildpack.enabled, Color::Green),
                self.flag_cell(buildpack.locked, Color::Yellow),
                Cell::new(buildpack.filename.as_deref().unwrap_or("-")),
            ]);
        }

        println!("{table}");
        Ok(())
    }

    fn render_install_report(&self, summaries: &[InstallSummary]) -> io::Result<()> {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Buildpack").add_attribute(Attribute::Bold),
            Cell::new("File").add_attribute(Attribute::Bold),
            Cell::new("Action").add_attribute(Attribute::Bold),
            Cell::new("Result").add_attribute(Attribute::Bold),
            Cell::new("Guid").add_attribute(Attribute::Bold),
        ]);

        for summary in summaries {
            let result = match &summary.outcome {
                InstallOutcome::Installed { created: true, .. } => "created",
                InstallOutcome::Installed { uploaded: true, .. } => "updated",
                InstallOutcome::Installed { .. } => "unchanged",
                InstallOutcome::LockedSkip { .. } => "locked, skipped",
            };
            table.add_row(vec![
                Cell::new(&summary.name),
                Cell::new(&summary.filename),
                Cell::new(summary.action),
                Cell::new(result),
                Cell::new(summary.outcome.guid()),
            ]);
        }

        println!("{table}");
        println!(
            "{}",
            self.style_success(&format!("{} buildpack file(s) processed", summaries.len()))
        );
        Ok(())
    }

    fn flag_cell(&self, value: bool, color: Color) -> Cell {
        let cell = Cell::new(if value { "yes" } else { "no" });
        if value && self.supports_color() {
            cell.fg(color)
        } else {
            cell
        }
    }

    fn style_success(&self, text: &str) -> String {
        if self.supports_color() {
            Style::new().green().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}
