pub mod line;
pub mod validate;

pub use line::{parse_line, CandidateRow, FailureReason, RawLine, RowStatus};
pub use validate::validate_row;

use crate::config::{CategoryConfig, RosterConfig};

/// Parses and validates one category's raw lines in capture order.
///
/// Every input line yields exactly one CandidateRow; invalid rows are
/// marked, not dropped.
pub fn parse_category_lines(
    lines: Vec<RawLine>,
    category: &CategoryConfig,
    config: &RosterConfig,
) -> Vec<CandidateRow> {
    lines
        .into_iter()
        .map(|raw| {
            let row = parse_line(raw, category, &config.digit_confusions);
            validate_row(row, category, &config.artifact_names)
        })
        .collect()
}
