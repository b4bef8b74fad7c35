//! Cross-category merging of aggregated rosters.
//!
//! Each category scan produces its own roster with its own OCR spelling of
//! every name. The merger seeds the final roster with the category that saw
//! the most members (the most complete name list) and folds the remaining
//! categories in one at a time through the same normalize/match pipeline.
//!
//! This is the most consequential step for output correctness: a false
//! match silently merges two real people, a false non-match leaves
//! duplicates in the output. The similarity threshold is therefore the
//! pipeline's primary tuning parameter, and every metric overwrite is
//! recorded rather than silently applied.

use serde::Serialize;

use crate::reconcile::aggregate::{choose_canonical_name, CategoryRoster, MemberRecord};
use crate::reconcile::matcher::{best_match, MatchCandidate};

/// One metric conflict observed while folding a category in. Conflicts are
/// only possible via re-scans, since metrics are disjoint per category.
#[derive(Debug, Clone, Serialize)]
pub struct MetricConflict {
    pub member: String,
    pub metric: String,
    /// Category whose value arrived second
    pub category: String,
    pub previous: u64,
    pub incoming: u64,
    /// Value that survived the conflict policy
    pub kept: u64,
}

/// Audit summary of one merge pass.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    /// Category whose roster seeded the merge (largest member count)
    pub seed_category: String,
    /// Members from later categories matched to an existing record
    pub matched: usize,
    /// Members from later categories appended as new records
    pub appended: usize,
    pub conflicts: Vec<MetricConflict>,
}

/// The merged roster before ranking.
#[derive(Debug, Clone)]
pub struct MergedRoster {
    pub members: Vec<MemberRecord>,
    pub keys: Vec<String>,
    pub report: MergeReport,
}

/// Merges the per-category rosters into one record per member.
///
/// Seed is the roster with the most members (earliest wins a tie); the
/// remaining rosters fold in input order. Conflict policy: the
/// later-processed value wins when its confidence is at least the
/// incumbent's; either way the conflict is logged and recorded.
pub fn merge_categories(rosters: Vec<CategoryRoster>, threshold: f64) -> MergedRoster {
    let seed_index = rosters
        .iter()
        .enumerate()
        .max_by_key(|(i, r)| (r.members.len(), usize::MAX - i))
        .map(|(i, _)| i);

    let Some(seed_index) = seed_index else {
        return MergedRoster {
            members: Vec::new(),
            keys: Vec::new(),
            report: MergeReport {
                seed_category: String::new(),
                matched: 0,
                appended: 0,
                conflicts: Vec::new(),
            },
        };
    };

    let mut rosters = rosters;
    let seed = rosters.remove(seed_index);
    crate::log(&format!(
        "Merge seeded from '{}' ({} members)",
        seed.category,
        seed.members.len()
    ));

    let mut members = seed.members;
    let mut keys = seed.keys;
    let mut report = MergeReport {
        seed_category: seed.category,
        matched: 0,
        appended: 0,
        conflicts: Vec::new(),
    };

    for roster in rosters {
        for (member, key) in roster.members.into_iter().zip(roster.keys) {
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
                    report.matched += 1;
                    fold_member(
                        &mut members[found.index],
                        member,
                        &roster.category,
                        &mut report.conflicts,
                    );
                }
                None => {
                    report.appended += 1;
                    members.push(member);
                    keys.push(key);
                }
            }
        }
    }

    MergedRoster {
        members,
        keys,
        report,
    }
}

/// Folds a later category's record into an existing member.
fn fold_member(
    existing: &mut MemberRecord,
    incoming: MemberRecord,
    category: &str,
    conflicts: &mut Vec<MetricConflict>,
) {
    for (metric, value) in incoming.metrics {
        let confidence = incoming
            .metric_confidence
            .get(&metric)
            .copied()
            .unwrap_or(0.0);

        match existing.metrics.get(&metric).copied() {
            None => {
                existing.metrics.insert(metric.clone(), value);
                existing.metric_confidence.insert(metric, confidence);
            }
            Some(previous) => {
                let existing_confidence = existing
                    .metric_confidence
                    .get(&metric)
                    .copied()
                    .unwrap_or(0.0);
                let incoming_wins = confidence >= existing_confidence;
                let kept = if incoming_wins { value } else { previous };

                crate::log(&format!(
                    "Metric conflict for '{}': {} {} -> {} from '{}', kept {}",
                    existing.canonical_name, metric, previous, value, category, kept
                ));
                conflicts.push(MetricConflict {
                    member: existing.canonical_name.clone(),
                    metric: metric.clone(),
                    category: category.to_string(),
                    previous,
                    incoming: value,
                    kept,
                });

                if incoming_wins {
                    existing.metrics.insert(metric.clone(), value);
                    existing.metric_confidence.insert(metric, confidence);
                }
            }
        }
    }

    if existing.read_rank.is_none() {
        existing.read_rank = incoming.read_rank;
    }
    existing.provenance.extend(incoming.provenance);
    // The later category may attest a better spelling than the seed saw
    existing.canonical_name = choose_canonical_name(&existing.provenance);
}
