//! Canonical board data model.
//!
//! All downstream logic (reconciliation, diffing, persistence) operates on
//! the strict types defined here; loose payload handling lives entirely in
//! the [`normalize`](crate::normalize) boundary module.

mod board;

pub use board::{Attachment, Card, Column, Snapshot};
