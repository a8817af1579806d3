//! `check` command handler: one full observation cycle.
//!
//! Reads an already-fetched payload (file or stdin — the network fetch is a
//! separate collaborator), reconciles it against the stored previous state,
//! persists the new versions, and reports the changes.

use crate::diff::DiffEngine;
use crate::normalize::{normalize, read_payload, read_payload_from};
use crate::reports::SummaryRenderer;
use crate::store::TemporalStore;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Options for the `check` command.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Payload file path; "-" reads stdin
    pub payload: PathBuf,
    /// Board id override when the payload carries none
    pub board_id: Option<String>,
    /// State database path
    pub db_path: PathBuf,
    /// Emit the changeset as JSON instead of the text summary
    pub json: bool,
    /// Exit with code 1 when changes were detected
    pub fail_on_change: bool,
    pub no_color: bool,
    pub quiet: bool,
}

/// Run one observation cycle. Returns the process exit code.
pub fn run_check(options: CheckOptions) -> Result<i32> {
    let raw = if options.payload.as_os_str() == "-" {
        read_payload_from(&mut std::io::stdin().lock()).context("reading payload from stdin")?
    } else {
        read_payload(&options.payload)
            .with_context(|| format!("reading payload from {}", options.payload.display()))?
    };

    let now = Utc::now();
    let mut snapshot = normalize(&raw, now);
    if let Some(board_id) = &options.board_id {
        snapshot.board_id.clone_from(board_id);
    }
    if snapshot.board_id.is_empty() {
        bail!("payload carries no board id; pass --board to name it");
    }

    let mut store = TemporalStore::open(&options.db_path)
        .with_context(|| format!("opening state database {}", options.db_path.display()))?;

    // Corrupt previous state degrades to first-run behavior inside
    // load_previous; monitoring must not stop over lost history.
    let previous = store.load_previous(&snapshot.board_id);
    debug!(
        board = %snapshot.board_id,
        first_run = previous.is_none(),
        cards = snapshot.card_count(),
        "comparing against previous state"
    );

    let changeset = DiffEngine::new().compare(previous.as_ref(), &snapshot);
    let report = store
        .write(&snapshot, &changeset, now)
        .context("persisting observation")?;
    for failure in &report.failures {
        warn!(
            kind = failure.entity_kind,
            entity = %failure.entity_id,
            "not persisted: {}",
            failure.message
        );
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&changeset)?);
    } else if !options.quiet || changeset.has_changes() {
        let renderer = if options.no_color {
            SummaryRenderer::new().no_color()
        } else {
            SummaryRenderer::new()
        };
        println!("{}", renderer.render_changeset(&changeset));
    }

    if !report.is_clean() {
        eprintln!(
            "warning: {} entities could not be persisted (see log)",
            report.failures.len()
        );
    }

    Ok(i32::from(options.fail_on_change && changeset.has_changes()))
}
