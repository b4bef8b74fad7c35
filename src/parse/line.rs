//! Line parsing: one raw OCR line into one candidate row.
//!
//! OCR output from the alliance list is noisy: thousands separators show up
//! as commas, periods, or stray spaces, round letters come back instead of
//! zeros, and vertical strokes instead of ones. Parsing never fails: every
//! input line produces a [`CandidateRow`], valid or marked with the reason
//! it is not.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::config::{CategoryConfig, DigitConfusion};

/// Pattern a repaired token must match to count as a metric value:
/// digit groups optionally joined by comma/period separators.
const NUMERIC_TOKEN_PATTERN: &str = r"^(\d+[,.])*\d+$";

fn numeric_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NUMERIC_TOKEN_PATTERN).expect("numeric token pattern is valid"))
}

/// One OCR text line with its capture provenance.
#[derive(Debug, Clone, Serialize)]
pub struct RawLine {
    /// Verbatim OCR text
    pub text: String,
    /// Category tag assigned by the capture collaborator
    pub category: String,
    /// Which scan of this category the line came from (re-scans increment)
    pub scan_index: u32,
    /// Position in the capture sequence within the scan
    pub capture_order: u32,
    /// OCR engine confidence for this line (0.0–1.0)
    pub confidence: f32,
}

impl RawLine {
    pub fn new(
        text: impl Into<String>,
        category: impl Into<String>,
        scan_index: u32,
        capture_order: u32,
        confidence: f32,
    ) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
            scan_index,
            capture_order,
            confidence,
        }
    }
}

/// Why a row was marked invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    /// Fewer trailing numeric tokens than the category requires
    InsufficientFields,
    /// Name empty after trimming
    EmptyName,
    /// A metric value outside its plausible range
    OutOfRange,
    /// Name looks like UI chrome (headers, separators) rather than a member
    UiArtifact,
}

/// Row validity, carried explicitly rather than as optional attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowStatus {
    Valid,
    Invalid(FailureReason),
}

/// One parsed candidate row. Invalid rows keep their raw text and flow
/// through to the audit trail; only valid rows reach aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateRow {
    pub raw: RawLine,
    /// Member name as read, None when parsing could not assemble one
    pub name: Option<String>,
    /// Rank displayed by the game UI, when the category carries one
    pub read_rank: Option<u32>,
    /// Metric values keyed by metric name
    pub metrics: BTreeMap<String, u64>,
    pub status: RowStatus,
}

impl CandidateRow {
    pub fn is_valid(&self) -> bool {
        self.status == RowStatus::Valid
    }

    /// OCR confidence of the source line.
    pub fn confidence(&self) -> f32 {
        self.raw.confidence
    }

    fn unparsable(raw: RawLine, reason: FailureReason) -> Self {
        Self {
            raw,
            name: None,
            read_rank: None,
            metrics: BTreeMap::new(),
            status: RowStatus::Invalid(reason),
        }
    }
}

/// Parses one raw OCR line against a category's expected column layout.
///
/// Tokenizes on whitespace runs. The last N tokens that parse as numbers
/// (N = the category's metric count) fill the metric slots in declared
/// order; remaining leading tokens re-join as the name. When the category
/// displays a rank column, a numeric first token is consumed as the
/// OCR-read rank before the name is assembled.
///
/// Total function: malformed input yields an invalid row, never a panic.
pub fn parse_line(
    raw: RawLine,
    category: &CategoryConfig,
    confusions: &[DigitConfusion],
) -> CandidateRow {
    let tokens: Vec<&str> = raw.text.split_whitespace().collect();
    let parsed: Vec<Option<u64>> = tokens
        .iter()
        .map(|t| parse_metric_token(t, confusions))
        .collect();

    let needed = category.metrics.len();

    // Walk backwards collecting the trailing numeric run, newest slot last.
    let mut values: Vec<u64> = Vec::with_capacity(needed);
    let mut name_end = tokens.len();
    for i in (0..tokens.len()).rev() {
        if values.len() == needed {
            break;
        }
        match parsed[i] {
            Some(v) => {
                values.push(v);
                name_end = i;
            }
            None => {
                // Stray OCR punctuation around the values does not end the
                // run; a token with any alphanumeric content does
                if tokens[i].chars().all(|c| !c.is_alphanumeric()) {
                    continue;
                }
                break;
            }
        }
    }

    if values.len() < needed {
        return CandidateRow::unparsable(raw, FailureReason::InsufficientFields);
    }
    values.reverse();

    let mut name_tokens = &tokens[..name_end];
    let mut read_rank = None;
    if category.leading_rank && !name_tokens.is_empty() {
        if let Some(v) = parsed[0] {
            read_rank = u32::try_from(v).ok();
            name_tokens = &name_tokens[1..];
        }
    }

    let name = name_tokens.join(" ");
    let metrics = category
        .metrics
        .iter()
        .zip(values)
        .map(|(m, v)| (m.name.clone(), v))
        .collect();

    CandidateRow {
        raw,
        name: Some(name),
        read_rank,
        metrics,
        status: RowStatus::Valid,
    }
}

/// Recognizes a token as a metric value, repairing common OCR digit
/// confusions first. Returns None for anything that is not number-shaped.
fn parse_metric_token(token: &str, confusions: &[DigitConfusion]) -> Option<u64> {
    let repaired: String = token
        .chars()
        .map(|c| {
            confusions
                .iter()
                .find(|s| s.from == c)
                .map_or(c, |s| s.to)
        })
        .collect();

    if !numeric_token_regex().is_match(&repaired) {
        return None;
    }

    let digits: String = repaired.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<u64>().ok()
}
