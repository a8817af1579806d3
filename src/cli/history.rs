//! `history` command handler: change-ledger queries.

use crate::reports::SummaryRenderer;
use crate::store::TemporalStore;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::path::PathBuf;

/// Options for the `history` command.
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    pub board_id: String,
    pub db_path: PathBuf,
    /// Maximum number of entries to show
    pub limit: usize,
    /// Only changes at or after this time (ISO date or date-time)
    pub since: Option<String>,
    /// Only changes touching this card id
    pub card: Option<String>,
    /// Emit entries as JSON
    pub json: bool,
    pub no_color: bool,
}

/// Show the change history of a board, newest first.
pub fn run_history(options: HistoryOptions) -> Result<()> {
    let since = options
        .since
        .as_deref()
        .map(parse_since)
        .transpose()
        .context("parsing --since")?;

    let store = TemporalStore::open(&options.db_path)
        .with_context(|| format!("opening state database {}", options.db_path.display()))?;

    let board = store
        .boards()?
        .into_iter()
        .find(|b| b.board_id == options.board_id);
    let Some(board) = board else {
        println!(
            "No history found for board {}. Run 'board-watch check' first.",
            options.board_id
        );
        return Ok(());
    };

    let entries = store.history(
        &options.board_id,
        since,
        options.card.as_deref(),
        options.limit,
    )?;

    if options.json {
        let rows: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "timestamp": e.timestamp.to_rfc3339(),
                    "kind": e.kind,
                    "card_id": e.card_id,
                    "details": e.details,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let renderer = if options.no_color {
        SummaryRenderer::new().no_color()
    } else {
        SummaryRenderer::new()
    };
    let board_name = if board.name.is_empty() {
        board.board_id.clone()
    } else {
        board.name.clone()
    };
    println!("{}", renderer.render_history(&board_name, &entries));
    Ok(())
}

/// Accept `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, or full RFC 3339.
fn parse_since(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    bail!("invalid date '{value}'; use YYYY-MM-DD or YYYY-MM-DD HH:MM:SS")
}
