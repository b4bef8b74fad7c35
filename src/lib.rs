//! Fate War Roster Reconciliation
//!
//! Turns noisy OCR text captured from the Fate War alliance screens into one
//! consolidated, ranked record per member. Each tracked metric category
//! (Power, Kills, ...) is scanned independently with overlapping scroll
//! captures, so the same member shows up many times with OCR spelling
//! variance; this crate parses the raw lines, validates them, collapses
//! scroll-overlap duplicates within a category, and fuzzily merges the
//! per-category rosters into the final roster.
//!
//! Capture, navigation, and the OCR engine itself live in the surrounding
//! automation tool; this crate consumes [`RawLine`]s and produces ordered
//! [`RankedMember`]s plus a full audit trail.

pub mod config;
pub mod export;
pub mod parse;
pub mod reconcile;

pub use config::{CategoryConfig, MetricConfig, RosterConfig};
pub use parse::line::{CandidateRow, FailureReason, RawLine, RowStatus};
pub use reconcile::aggregate::{CategoryRoster, MemberRecord, ScanReport};
pub use reconcile::merge::{MergeReport, MetricConflict};
pub use reconcile::rank::RankedMember;
pub use reconcile::{reconcile, Reconciliation};

use chrono::Local;

/// Logs a message to the console with a timestamp.
pub(crate) fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    println!("[{}] {}", timestamp, msg);
}
