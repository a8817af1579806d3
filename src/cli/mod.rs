//! Command handlers behind the binary's argument parsing.
//!
//! `main.rs` owns the clap surface; each handler here takes a plain options
//! struct so the flows stay callable from tests.

mod check;
mod history;
mod view;

pub use check::{run_check, CheckOptions};
pub use history::{run_history, HistoryOptions};
pub use view::{run_inspect, run_list, run_show};
