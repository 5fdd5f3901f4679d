//! Event handling and status display

use crate::logging::log_event_with_tracing;
use bpi_events::{AppEvent, EventMessage, InstallEvent};
use bpi_types::display_stack;
use console::{Style, Term};

/// Forwards events to tracing and prints short status lines
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    quiet: bool,
}

impl EventHandler {
    /// `quiet` suppresses status lines, e.g. in JSON mode
    pub fn new(colors_enabled: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            quiet,
        }
    }

    pub fn handle_event(&mut self, message: &EventMessage) {
        log_event_with_tracing(message);
        if self.quiet {
            return;
        }

        if let AppEvent::Install(event) = &message.event {
            match event {
                InstallEvent::Started { name, action } => {
                    self.show_status(&format!("Installing {name} ({action})"));
                }
                InstallEvent::Uploaded {
                    name,
                    filename,
                    stack,
                    changed: false,
                    ..
                } => {
                    self.show_status(&format!(
                        "{name}: {filename} already stored for stack {}",
                        display_stack(stack.as_deref())
                    ));
                }
                InstallEvent::Skipped { name, reason, .. } => {
                    self.show_warning(&format!("{name} not updated: {reason}"));
                }
                InstallEvent::RolledBack { name, guid } => {
                    self.show_warning(&format!("{name}: removed record {guid} after failed upload"));
                }
                InstallEvent::Failed { name, failure } => {
                    self.show_error(&format!("{name}: {}", failure.message));
                }
                _ => {}
            }
        }
    }

    fn show_status(&self, message: &str) {
        let _ = self.term.write_line(message);
    }

    fn show_warning(&self, message: &str) {
        let line = if self.colors_enabled {
            Style::new().yellow().apply_to(message).to_string()
        } else {
            message.to_string()
        };
        let _ = self.term.write_line(&line);
    }

    fn show_error(&self, message: &str) {
        let line = if self.colors_enabled {
            Style::new().red().bold().apply_to(message).to_string()
        } else {
            message.to_string()
        };
        let _ = self.term.write_line(&line);
    }
}
