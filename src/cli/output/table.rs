//! Table output formatting for CLI commands
//!
//! Tables for task records and transition rules using comfy-table.
//! Colors are dropped when `NO_COLOR` is set or the terminal is dumb.

use crate::domain::models::{split_state, Phase, TaskRecord, TransitionRule};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format task records as a table
    pub fn format_tasks(&self, tasks: &[TaskRecord]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Task").add_attribute(Attribute::Bold),
            Cell::new("State").add_attribute(Attribute::Bold),
            Cell::new("Step").add_attribute(Attribute::Bold),
            Cell::new("Active").add_attribute(Attribute::Bold),
            Cell::new("Updated").add_attribute(Attribute::Bold),
        ]);

        for task in tasks {
            let state_cell = if self.use_colors {
                Cell::new(&task.current_state).fg(state_color(&task.current_state))
            } else {
                Cell::new(&task.current_state)
            };

            let active = if task.is_active { "*" } else { "" };
            let step = format!("{}/{}", task.completed_steps, task.current_step);

            table.add_row(vec![
                Cell::new(super::truncate(&task.task_id, 36)),
                state_cell,
                Cell::new(step),
                Cell::new(active),
                Cell::new(task.updated_at.format("%Y-%m-%d %H:%M").to_string()),
            ]);
        }

        table.to_string()
    }

    /// Format transition rules as a table
    pub fn format_rules(&self, rules: &[TransitionRule]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Trigger").add_attribute(Attribute::Bold),
            Cell::new("Source").add_attribute(Attribute::Bold),
            Cell::new("Destination").add_attribute(Attribute::Bold),
        ]);

        for rule in rules {
            let destination = if self.use_colors {
                Cell::new(&rule.destination).fg(state_color(&rule.destination))
            } else {
                Cell::new(&rule.destination)
            };
            table.add_row(vec![
                Cell::new(rule.trigger.as_str()),
                Cell::new(&rule.source),
                destination,
            ]);
        }

        table.to_string()
    }

    /// Create a base table with common settings
    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

/// Map a composite state to a color by its substate
fn state_color(state: &str) -> Color {
    let (phase, substate) = split_state(state);
    if Phase::from_str(phase) == Some(Phase::Done) {
        return Color::Green;
    }
    match substate {
        "verified" => Color::Green,
        "aireview" | "devreview" => Color::Yellow,
        s if s.ends_with("aireview") || s.ends_with("devreview") => Color::Yellow,
        "working" => Color::Cyan,
        _ => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Trigger;

    #[test]
    fn test_format_tasks_without_colors() {
        let formatter = TableFormatter::with_config(false, Some(120));
        let mut record = TaskRecord::new("T-1", "coding_working");
        record.is_active = true;

        let rendered = formatter.format_tasks(&[record]);
        assert!(rendered.contains("T-1"));
        assert!(rendered.contains("coding_working"));
        assert!(rendered.contains('*'));
    }

    #[test]
    fn test_format_rules_lists_every_rule() {
        let formatter = TableFormatter::with_config(false, Some(120));
        let rules = vec![
            TransitionRule::new(Trigger::Advance, "coding_verified", "testing_working"),
            TransitionRule::new(Trigger::HumanApproves, "testing_devreview", "testing_verified"),
        ];

        let rendered = formatter.format_rules(&rules);
        assert!(rendered.contains("advance"));
        assert!(rendered.contains("testing_devreview"));
        assert!(rendered.contains("testing_verified"));
    }

    #[test]
    fn test_state_color() {
        assert_eq!(state_color("done"), Color::Green);
        assert_eq!(state_color("coding_verified"), Color::Green);
        assert_eq!(state_color("coding_aireview"), Color::Yellow);
        assert_eq!(state_color("planning_strategydevreview"), Color::Yellow);
        assert_eq!(state_color("coding_working"), Color::Cyan);
    }
}
