//! Per-category scan aggregation.
//!
//! One scan scrolls through the whole member list with deliberately
//! overlapping captures, so most members appear in two or more candidate
//! rows. This module folds one category's capture-ordered rows into exactly
//! one record per member, keeping the more trustworthy value whenever the
//! same member is seen twice.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::parse::line::CandidateRow;
use crate::reconcile::matcher::{best_match, MatchCandidate};
use crate::reconcile::normalize::normalize_name;

/// One consolidated member. Built up by the aggregator and merger, frozen
/// once ranking starts.
#[derive(Debug, Clone, Serialize)]
pub struct MemberRecord {
    /// Best surviving spelling of the name (most frequent, then longest,
    /// then first-seen among provenance rows)
    pub canonical_name: String,
    /// Rank the game UI displayed, when a scanned category carried one
    pub read_rank: Option<u32>,
    /// One value per metric name
    pub metrics: BTreeMap<String, u64>,
    /// OCR confidence backing each metric value, used by conflict policy
    pub metric_confidence: BTreeMap<String, f32>,
    /// Every candidate row that contributed to this record, in order
    pub provenance: Vec<CandidateRow>,
}

impl MemberRecord {
    fn from_row(row: CandidateRow) -> Self {
        let confidence = row.confidence();
        let metrics = row.metrics.clone();
        let metric_confidence = metrics.keys().map(|k| (k.clone(), confidence)).collect();
        Self {
            canonical_name: row.name.clone().unwrap_or_default().trim().to_string(),
            read_rank: row.read_rank,
            metrics,
            metric_confidence,
            provenance: vec![row],
        }
    }

    /// How many rows corroborate this identity.
    pub fn corroboration(&self) -> usize {
        self.provenance.len()
    }

    /// Folds a duplicate view of the same member into this record.
    ///
    /// Per metric: a present value beats an absent one; when both are
    /// present the higher-confidence source wins, and a tie keeps the
    /// first-seen value.
    fn absorb(&mut self, row: CandidateRow) {
        let confidence = row.confidence();
        for (metric, &value) in &row.metrics {
            match self.metric_confidence.get(metric) {
                Some(&existing) if existing >= confidence => {}
                _ => {
                    self.metrics.insert(metric.clone(), value);
                    self.metric_confidence.insert(metric.clone(), confidence);
                }
            }
        }
        if self.read_rank.is_none() {
            self.read_rank = row.read_rank;
        }
        self.provenance.push(row);
        self.canonical_name = choose_canonical_name(&self.provenance);
    }
}

/// Picks the best surviving spelling from the provenance rows:
/// most frequent, then longest, then first-seen.
pub(crate) fn choose_canonical_name(provenance: &[CandidateRow]) -> String {
    let names: Vec<&str> = provenance
        .iter()
        .filter_map(|row| row.name.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in &names {
        *counts.entry(name).or_insert(0) += 1;
    }

    let mut best: Option<&str> = None;
    for name in &names {
        let better = match best {
            None => true,
            Some(current) => {
                let (count, current_count) = (counts[name], counts[current]);
                count > current_count
                    || (count == current_count
                        && name.chars().count() > current.chars().count())
            }
        };
        if better {
            best = Some(name);
        }
    }
    best.unwrap_or_default().to_string()
}

/// Counts surfaced to the caller after aggregating one category.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub category: String,
    /// Candidate rows seen
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    /// Valid rows folded into an already-seen member
    pub duplicates_merged: usize,
    /// Valid rows whose name normalized to an empty key and could not be
    /// aggregated under any identity
    pub skipped_empty_key: usize,
}

/// One category's aggregated roster: one record per member in first-seen
/// capture order, with the parallel normalized keys the records were
/// accepted under.
#[derive(Debug, Clone)]
pub struct CategoryRoster {
    pub category: String,
    pub members: Vec<MemberRecord>,
    /// Normalized key per member, same order as `members`
    pub keys: Vec<String>,
    pub report: ScanReport,
}

/// Collapses one category's capture-ordered candidate rows into one row per
/// member. Pure fold: the accumulator is owned locally and returned by
/// value; invalid rows are counted but never aggregated.
pub fn aggregate_scan(
    rows: &[CandidateRow],
    category: &str,
    threshold: f64,
) -> CategoryRoster {
    let mut members: Vec<MemberRecord> = Vec::new();
    let mut keys: Vec<String> = Vec::new();
    let mut valid_rows = 0;
    let mut duplicates_merged = 0;
    let mut skipped_empty_key = 0;

    for row in rows {
        if !row.is_valid() {
            continue;
        }
        valid_rows += 1;

        let key = normalize_name(row.name.as_deref().unwrap_or(""));
        if key.is_empty() {
            skipped_empty_key += 1;
            continue;
        }

        let candidates: Vec<MatchCandidate> = keys
            .iter()
            .zip(&members)
            .map(|(key, member)| MatchCandidate {
                key,
                corroboration: member.corroboration(),
            })
            .collect();

        match best_match(&key, &candidates, threshold) {
            Some(found) => {
                duplicates_merged += 1;
                members[found.index].absorb(row.clone());
            }
            None => {
                members.push(MemberRecord::from_row(row.clone()));
                keys.push(key);
            }
        }
    }

    CategoryRoster {
        category: category.to_string(),
        members,
        keys,
        report: ScanReport {
            category: category.to_string(),
            total_rows: rows.len(),
            valid_rows,
            invalid_rows: rows.len() - valid_rows,
            duplicates_merged,
            skipped_empty_key,
        },
    }
}
