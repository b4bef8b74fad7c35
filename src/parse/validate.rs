//! Row validation: plausibility checks on parsed candidate rows.
//!
//! Invalid rows are marked with a specific reason but never discarded:
//! they flow through to the audit trail and debug dump, and are excluded
//! from aggregation.

use crate::config::CategoryConfig;
use crate::parse::line::{CandidateRow, FailureReason, RowStatus};

/// Applies plausibility checks in order: non-empty name, metric ranges,
/// UI-chrome detection. The first failing check sets the failure reason.
pub fn validate_row(
    row: CandidateRow,
    category: &CategoryConfig,
    artifact_names: &[String],
) -> CandidateRow {
    if !row.is_valid() {
        return row;
    }

    let name = row.name.as_deref().unwrap_or("").trim();
    if name.is_empty() {
        return mark(row, FailureReason::EmptyName);
    }

    for metric in &category.metrics {
        if let Some(&value) = row.metrics.get(&metric.name) {
            if value < metric.min || value > metric.max {
                return mark(row, FailureReason::OutOfRange);
            }
        }
    }

    if is_ui_artifact(name, artifact_names) {
        return mark(row, FailureReason::UiArtifact);
    }

    row
}

/// True when the name is UI chrome rather than a member: pure
/// punctuation/symbols, or one of the known header/footer strings the OCR
/// engine sometimes returns as a row of its own.
fn is_ui_artifact(name: &str, artifact_names: &[String]) -> bool {
    if name.chars().all(|c| !c.is_alphanumeric()) {
        return true;
    }
    let folded = name.to_lowercase();
    artifact_names
        .iter()
        .any(|artifact| folded == artifact.to_lowercase())
}

fn mark(mut row: CandidateRow, reason: FailureReason) -> CandidateRow {
    row.status = RowStatus::Invalid(reason);
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DigitConfusion, MetricConfig, RosterConfig};
    use crate::parse::line::{parse_line, RawLine};

    fn category() -> CategoryConfig {
        CategoryConfig {
            name: "Power".to_string(),
            metrics: vec![
                MetricConfig {
                    name: "power".to_string(),
                    min: 1_000,
                    max: 500_000_000,
                },
                MetricConfig {
                    name: "kills".to_string(),
                    min: 0,
                    max: 1_000_000,
                },
            ],
            leading_rank: false,
        }
    }

    fn parsed(text: &str) -> CandidateRow {
        let confusions: Vec<DigitConfusion> = RosterConfig::default().digit_confusions;
        parse_line(RawLine::new(text, "Power", 0, 0, 0.9), &category(), &confusions)
    }

    fn artifacts() -> Vec<String> {
        RosterConfig::default().artifact_names
    }

    #[test]
    fn test_valid_row_passes() {
        let row = validate_row(parsed("DragonSlayer 4500000 321"), &category(), &artifacts());
        assert!(row.is_valid());
    }

    #[test]
    fn test_empty_name_marked() {
        let row = validate_row(parsed("4500000 321"), &category(), &artifacts());
        assert_eq!(row.status, RowStatus::Invalid(FailureReason::EmptyName));
        // Raw text retained for the debug trail
        assert_eq!(row.raw.text, "4500000 321");
    }

    #[test]
    fn test_out_of_range_low() {
        // power below the configured minimum of 1000
        let row = validate_row(parsed("Newbie 500 3"), &category(), &artifacts());
        assert_eq!(row.status, RowStatus::Invalid(FailureReason::OutOfRange));
    }

    #[test]
    fn test_out_of_range_high() {
        // power above the configured maximum
        let row = validate_row(parsed("Cheater 999999999999 3"), &category(), &artifacts());
        assert_eq!(row.status, RowStatus::Invalid(FailureReason::OutOfRange));
    }

    #[test]
    fn test_pure_punctuation_name_is_artifact() {
        let row = validate_row(parsed("###@@@ 99999 1"), &category(), &artifacts());
        assert_eq!(row.status, RowStatus::Invalid(FailureReason::UiArtifact));
    }

    #[test]
    fn test_header_string_is_artifact() {
        let row = validate_row(parsed("Alliance 2000000 50"), &category(), &artifacts());
        assert_eq!(row.status, RowStatus::Invalid(FailureReason::UiArtifact));
    }

    #[test]
    fn test_header_match_is_case_insensitive() {
        let row = validate_row(parsed("POWER 2000000 50"), &category(), &artifacts());
        assert_eq!(row.status, RowStatus::Invalid(FailureReason::UiArtifact));
    }

    #[test]
    fn test_already_invalid_row_unchanged() {
        let row = parsed("NoNumbersHere");
        assert_eq!(row.status, RowStatus::Invalid(FailureReason::InsufficientFields));
        let row = validate_row(row, &category(), &artifacts());
        assert_eq!(row.status, RowStatus::Invalid(FailureReason::InsufficientFields));
    }
}
