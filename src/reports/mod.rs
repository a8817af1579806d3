//! Plain-text report rendering for terminal output.
//!
//! Renderers return strings so output is testable; writing to stdout is the
//! CLI's job.

use crate::diff::Changeset;
use crate::model::Snapshot;
use crate::store::{BoardInfo, LedgerEntry};

/// Apply ANSI color formatting if colored output is enabled.
fn ansi_color(text: &str, color: &str, colored: bool) -> String {
    if colored {
        match color {
            "red" => format!("\x1b[31m{text}\x1b[0m"),
            "green" => format!("\x1b[32m{text}\x1b[0m"),
            "yellow" => format!("\x1b[33m{text}\x1b[0m"),
            "cyan" => format!("\x1b[36m{text}\x1b[0m"),
            "bold" => format!("\x1b[1m{text}\x1b[0m"),
            "dim" => format!("\x1b[2m{text}\x1b[0m"),
            _ => text.to_string(),
        }
    } else {
        text.to_string()
    }
}

/// Summary renderer for shell output.
pub struct SummaryRenderer {
    colored: bool,
}

impl SummaryRenderer {
    /// Create a new renderer with colored output.
    #[must_use]
    pub const fn new() -> Self {
        Self { colored: true }
    }

    /// Disable colored output.
    #[must_use]
    pub const fn no_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        ansi_color(text, color, self.colored)
    }

    /// Render a changeset for the terminal.
    #[must_use]
    pub fn render_changeset(&self, changeset: &Changeset) -> String {
        let mut lines = Vec::new();

        if changeset.is_first_run {
            lines.push(self.color("First check of this board", "bold"));
            lines.push(format!(
                "Recorded {} columns and {} cards as the baseline.",
                changeset.columns_count, changeset.cards_count
            ));
            return lines.join("\n");
        }

        if !changeset.has_changes() {
            lines.push(self.color("No changes detected", "dim"));
            return lines.join("\n");
        }

        lines.push(self.color("Changes detected", "bold"));
        lines.push(self.color(&"─".repeat(40), "dim"));

        for column in &changeset.columns.added {
            lines.push(format!(
                "  {} column \"{}\"",
                self.color("+", "green"),
                column.name
            ));
        }
        for column in &changeset.columns.removed {
            lines.push(format!(
                "  {} column \"{}\"",
                self.color("-", "red"),
                column.name
            ));
        }
        for renamed in &changeset.columns.renamed {
            lines.push(format!(
                "  {} column \"{}\" renamed to \"{}\"",
                self.color("~", "yellow"),
                renamed.old_name,
                renamed.new_name
            ));
        }
        for moved in &changeset.columns.moved {
            lines.push(format!(
                "  {} column \"{}\" moved {} → {}",
                self.color("~", "yellow"),
                moved.name,
                moved.old_position,
                moved.new_position
            ));
        }

        for card in &changeset.cards.added {
            lines.push(format!(
                "  {} card \"{}\"{}",
                self.color("+", "green"),
                card.title,
                card.column
                    .as_deref()
                    .map(|c| format!(" in \"{c}\""))
                    .unwrap_or_default()
            ));
        }
        for card in &changeset.cards.removed {
            lines.push(format!(
                "  {} card \"{}\"",
                self.color("-", "red"),
                card.title
            ));
        }
        for modified in &changeset.cards.modified {
            let mut parts = Vec::new();
            if modified.title_changed() {
                parts.push(format!(
                    "title \"{}\" → \"{}\"",
                    modified.old_title, modified.new_title
                ));
            }
            if modified.description_changed() {
                parts.push("description".to_string());
            }
            if modified.link_changed() {
                parts.push("link".to_string());
            }
            if modified.column_changed() {
                parts.push(format!(
                    "moved {} → {}",
                    modified.old_column.as_deref().unwrap_or("(no column)"),
                    modified.new_column.as_deref().unwrap_or("(no column)")
                ));
            }
            for attachment in &modified.attachments_added {
                parts.push(format!("attachment \"{}\" added", attachment.filename));
            }
            for attachment in &modified.attachments_removed {
                parts.push(format!("attachment \"{}\" removed", attachment.filename));
            }
            lines.push(format!(
                "  {} card \"{}\": {}",
                self.color("~", "yellow"),
                modified.new_title,
                parts.join(", ")
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "{}  +{} -{} ~{} cards, board now has {}",
            self.color("Total:", "cyan"),
            changeset.cards.added.len(),
            changeset.cards.removed.len(),
            changeset.cards.modified.len(),
            changeset.cards_count
        ));

        lines.join("\n")
    }

    /// Render a snapshot: columns with their cards, then unassigned cards.
    #[must_use]
    pub fn render_snapshot(&self, snapshot: &Snapshot) -> String {
        let mut lines = Vec::new();

        let title = if snapshot.name.is_empty() {
            snapshot.board_id.clone()
        } else {
            format!("{} ({})", snapshot.name, snapshot.board_id)
        };
        lines.push(self.color(&title, "bold"));
        if !snapshot.description.is_empty() {
            lines.push(self.color(&snapshot.description, "dim"));
        }
        lines.push(format!(
            "{} columns, {} cards, captured {}",
            snapshot.column_count(),
            snapshot.card_count(),
            snapshot.captured_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        for column in snapshot.columns_by_position() {
            lines.push(String::new());
            lines.push(self.color(&format!("[{}] {}", column.position, column.name), "cyan"));
            for card in snapshot.cards_in_column(&column.id) {
                let attachments = if card.attachments.is_empty() {
                    String::new()
                } else {
                    format!(" ({} attachments)", card.attachments.len())
                };
                lines.push(format!("  - {}{attachments}", card.title));
            }
        }

        let unassigned = snapshot.unassigned_cards();
        if !unassigned.is_empty() {
            lines.push(String::new());
            lines.push(self.color("(no column)", "cyan"));
            for card in unassigned {
                lines.push(format!("  - {}", card.title));
            }
        }

        lines.join("\n")
    }

    /// Render the board registry listing.
    #[must_use]
    pub fn render_boards(&self, boards: &[BoardInfo]) -> String {
        if boards.is_empty() {
            return self
                .color("No boards have been checked yet.", "yellow");
        }
        let mut lines = vec![self.color("Monitored boards", "bold")];
        for board in boards {
            let name = if board.name.is_empty() {
                self.color("<unnamed>", "dim")
            } else {
                board.name.clone()
            };
            lines.push(format!(
                "  {}  {}  last checked {}",
                board.board_id,
                name,
                board.last_checked.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
        lines.join("\n")
    }

    /// Render the change history listing, newest first.
    #[must_use]
    pub fn render_history(&self, board_name: &str, entries: &[LedgerEntry]) -> String {
        if entries.is_empty() {
            return self.color("No recorded changes.", "yellow");
        }
        let mut lines = vec![self.color(&format!("History for {board_name}"), "bold")];
        for entry in entries {
            let marker = match entry.kind {
                crate::diff::ChangeKind::CardAdded => self.color("+", "green"),
                crate::diff::ChangeKind::CardRemoved => self.color("-", "red"),
                crate::diff::ChangeKind::CardMoved | crate::diff::ChangeKind::CardModified => {
                    self.color("~", "yellow")
                }
            };
            let title = entry.details["title"]
                .as_str()
                .or_else(|| entry.details["new_title"].as_str())
                .unwrap_or(&entry.card_id);
            lines.push(format!(
                "  {}  {} {} \"{}\"",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                marker,
                entry.kind,
                title
            ));
        }
        lines.join("\n")
    }
}

impl Default for SummaryRenderer {
    fn default() -> Self {
        Self::new()
    }
}
