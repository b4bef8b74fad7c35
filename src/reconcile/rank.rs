//! Final ranking of the merged roster.
//!
//! Sorts by the primary metric and assigns output order. Records are frozen
//! here: the finalizer wraps them, it never edits their content.

use serde::Serialize;
use std::cmp::Reverse;

use crate::reconcile::aggregate::MemberRecord;

/// One member in final output order.
#[derive(Debug, Clone, Serialize)]
pub struct RankedMember {
    /// 1-based rank by the primary metric
    pub rank: u32,
    /// True when the rank the game UI displayed disagrees with the rank
    /// computed here, either an OCR misread or a roster change between
    /// scans, worth a human look
    pub rank_mismatch: bool,
    pub record: MemberRecord,
}

/// Sorts by the primary metric descending with canonical name ascending as
/// the tie-break, then assigns ranks. A member missing the primary metric
/// sorts after every member that has one.
pub fn finalize_ranking(members: Vec<MemberRecord>, primary_metric: &str) -> Vec<RankedMember> {
    let mut members = members;
    members.sort_by(|a, b| {
        let a_value = a.metrics.get(primary_metric).copied();
        let b_value = b.metrics.get(primary_metric).copied();
        // Descending by value (Reverse puts None last), then name ascending
        (Reverse(a_value), &a.canonical_name).cmp(&(Reverse(b_value), &b.canonical_name))
    });

    members
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let rank = (i + 1) as u32;
            let rank_mismatch = record
                .read_rank
                .map(|read| read != rank)
                .unwrap_or(false);
            RankedMember {
                rank,
                rank_mismatch,
                record,
            }
        })
        .collect()
}
