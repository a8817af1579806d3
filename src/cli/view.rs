//! `show`, `list`, and `inspect` command handlers.

use crate::normalize::{normalize, read_payload, read_payload_from};
use crate::reports::SummaryRenderer;
use crate::store::TemporalStore;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;

fn renderer(no_color: bool) -> SummaryRenderer {
    if no_color {
        SummaryRenderer::new().no_color()
    } else {
        SummaryRenderer::new()
    }
}

/// Show the current stored state of a board.
pub fn run_show(board_id: &str, db_path: &Path, json: bool, no_color: bool) -> Result<()> {
    let store = TemporalStore::open(db_path)
        .with_context(|| format!("opening state database {}", db_path.display()))?;

    let Some(snapshot) = store.read_current(board_id)? else {
        println!(
            "No saved state found for board {board_id}.\n\
             Run 'board-watch check' first."
        );
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{}", renderer(no_color).render_snapshot(&snapshot));
    }
    Ok(())
}

/// List all boards that have been checked.
pub fn run_list(db_path: &Path, no_color: bool) -> Result<()> {
    let store = TemporalStore::open(db_path)
        .with_context(|| format!("opening state database {}", db_path.display()))?;
    let boards = store.boards()?;
    println!("{}", renderer(no_color).render_boards(&boards));
    Ok(())
}

/// Inspect a payload without touching stored state: normalize and display.
pub fn run_inspect(payload: &Path, no_color: bool) -> Result<()> {
    let raw = if payload.as_os_str() == "-" {
        read_payload_from(&mut std::io::stdin().lock()).context("reading payload from stdin")?
    } else {
        read_payload(payload)
            .with_context(|| format!("reading payload from {}", payload.display()))?
    };
    let snapshot = normalize(&raw, Utc::now());
    println!("{}", renderer(no_color).render_snapshot(&snapshot));
    Ok(())
}
