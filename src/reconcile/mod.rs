//! The reconciliation pipeline.
//!
//! Raw OCR lines go through parsing and validation, per-category
//! scroll-overlap aggregation, cross-category merging, and final ranking.
//! Single-threaded and synchronous; each stage exclusively owns what it
//! produces until it hands it to the next.

pub mod aggregate;
pub mod matcher;
pub mod merge;
pub mod normalize;
pub mod rank;

pub use aggregate::{aggregate_scan, CategoryRoster, MemberRecord, ScanReport};
pub use matcher::{best_match, similarity, BestMatch, MatchCandidate};
pub use merge::{merge_categories, MergeReport, MergedRoster, MetricConflict};
pub use normalize::normalize_name;
pub use rank::{finalize_ranking, RankedMember};

use anyhow::{bail, Result};
use serde::Serialize;

use crate::config::RosterConfig;
use crate::parse::{parse_category_lines, CandidateRow, RawLine};

/// Everything one reconciliation pass produces: the ranked roster plus the
/// full audit trail the export collaborator serializes.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    /// Final roster in output order
    pub members: Vec<RankedMember>,
    /// Per-category aggregation counts
    pub scan_reports: Vec<ScanReport>,
    pub merge_report: MergeReport,
    /// Every candidate row in capture order, valid and invalid, for
    /// debugging and human spot-checks
    pub rows: Vec<CandidateRow>,
}

/// Runs the whole pipeline over capture-ordered raw lines.
///
/// Lines must arrive fully materialized and capture-ordered within each
/// category; the upstream capture collaborator guarantees that. Data
/// quality never fails this function; malformed rows come back marked in
/// the audit trail. It only errs on contract violations: a broken config,
/// or a line tagged with a category the config does not declare.
pub fn reconcile(lines: Vec<RawLine>, config: &RosterConfig) -> Result<Reconciliation> {
    config.validate()?;

    for line in &lines {
        if config.category(&line.category).is_none() {
            bail!(
                "Raw line tagged with undeclared category '{}' (capture {})",
                line.category,
                line.capture_order
            );
        }
    }

    let mut rosters = Vec::with_capacity(config.categories.len());
    let mut scan_reports = Vec::with_capacity(config.categories.len());
    let mut all_rows = Vec::with_capacity(lines.len());

    for category in &config.categories {
        let category_lines: Vec<RawLine> = lines
            .iter()
            .filter(|l| l.category == category.name)
            .cloned()
            .collect();
        if category_lines.is_empty() {
            continue;
        }

        let rows = parse_category_lines(category_lines, category, config);
        let roster = aggregate_scan(&rows, &category.name, config.match_threshold);
        crate::log(&format!(
            "Category '{}': {} rows, {} valid, {} members after overlap merge",
            category.name,
            roster.report.total_rows,
            roster.report.valid_rows,
            roster.members.len()
        ));

        scan_reports.push(roster.report.clone());
        rosters.push(roster);
        all_rows.extend(rows);
    }

    let merged = merge_categories(rosters, config.match_threshold);
    let merge_report = merged.report.clone();
    let members = finalize_ranking(merged.members, &config.primary_metric);

    crate::log(&format!(
        "Reconciled {} members ({} appended outside the seed category, {} metric conflicts)",
        members.len(),
        merge_report.appended,
        merge_report.conflicts.len()
    ));

    Ok(Reconciliation {
        members,
        scan_reports,
        merge_report,
        rows: all_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{FailureReason, RowStatus};

    fn lines(category: &str, texts: &[&str]) -> Vec<RawLine> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| RawLine::new(*text, category, 0, i as u32, 0.9))
            .collect()
    }

    #[test]
    fn test_full_pipeline_two_categories_with_overlap() {
        let config = RosterConfig::default();
        let mut input = lines(
            "Power",
            &[
                "1 DragonSlayer 9,500,000",
                "2 MoonWalker 8200000",
                // Scroll overlap: both re-shown, one with a misread name
                "2 MoonWa1ker 8200000",
                "3 NightOwl 7000000",
            ],
        );
        input.extend(lines(
            "Kills",
            &[
                "DragonSlayer 431",
                "NightOwl 212",
                "MoonWalker 305",
                "###@@@ 99", // UI chrome picked up by OCR
            ],
        ));

        let result = reconcile(input, &config).unwrap();

        assert_eq!(result.members.len(), 3);
        let top = &result.members[0];
        assert_eq!(top.record.canonical_name, "DragonSlayer");
        assert_eq!(top.rank, 1);
        assert_eq!(top.record.metrics["power"], 9_500_000);
        assert_eq!(top.record.metrics["kills"], 431);
        assert!(!top.rank_mismatch);

        // Overlap duplicate collapsed, both categories merged
        let moon = &result.members[1];
        assert_eq!(moon.record.canonical_name, "MoonWalker");
        assert_eq!(moon.record.metrics["kills"], 305);

        // Audit trail keeps the artifact row, marked
        assert_eq!(result.rows.len(), 8);
        let artifact = result
            .rows
            .iter()
            .find(|r| r.raw.text.starts_with("###"))
            .unwrap();
        assert_eq!(artifact.status, RowStatus::Invalid(FailureReason::UiArtifact));
        // ...and it reached no member record
        for member in &result.members {
            assert!(member
                .record
                .provenance
                .iter()
                .all(|row| !row.raw.text.starts_with("###")));
        }
    }

    #[test]
    fn test_rank_mismatch_surfaces() {
        let config = RosterConfig::default();
        // UI shows Beta at rank 2 but Gamma out-powers it
        let input = lines(
            "Power",
            &[
                "1 Alpha 9000000",
                "2 Beta 5000000",
                "3 Gamma 6000000",
            ],
        );

        let result = reconcile(input, &config).unwrap();
        let by_name = |name: &str| {
            result
                .members
                .iter()
                .find(|m| m.record.canonical_name == name)
                .unwrap()
        };
        assert!(!by_name("Alpha").rank_mismatch);
        assert!(by_name("Gamma").rank_mismatch); // read 3, computed 2
        assert!(by_name("Beta").rank_mismatch); // read 2, computed 3
    }

    #[test]
    fn test_undeclared_category_fails_fast() {
        let config = RosterConfig::default();
        let input = lines("Charisma", &["Alpha 100"]);
        assert!(reconcile(input, &config).is_err());
    }

    #[test]
    fn test_broken_config_fails_fast() {
        let mut config = RosterConfig::default();
        config.categories[0].metrics.clear();
        assert!(reconcile(Vec::new(), &config).is_err());
    }

    #[test]
    fn test_empty_input_is_fine() {
        let config = RosterConfig::default();
        let result = reconcile(Vec::new(), &config).unwrap();
        assert!(result.members.is_empty());
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_member_count_within_bounds() {
        let config = RosterConfig::default();
        let mut input = lines("Power", &["Alpha 1000000", "Bravo 2000000"]);
        input.extend(lines("Kills", &["Alpha 10", "Charlie 20"]));

        let result = reconcile(input, &config).unwrap();
        // <= sum of per-category counts, >= max per-category count
        assert!(result.members.len() <= 4);
        assert!(result.members.len() >= 2);
        assert_eq!(result.members.len(), 3);
    }
}
