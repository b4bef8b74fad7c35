//! Export collaborator: serialization of reconciliation output.
//!
//! Writes the ranked roster as CSV and HTML, the full candidate-row audit
//! trail as a raw debug CSV, and the reports as pretty-printed JSON. The
//! core pipeline itself has no serialization concerns; everything here
//! consumes its plain ordered output.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::RosterConfig;
use crate::parse::line::{CandidateRow, RowStatus};
use crate::reconcile::rank::RankedMember;
use crate::reconcile::Reconciliation;

/// Builds a timestamped output path: `prefix_YYYY-MM-DD_HH-MM-SS.ext`.
pub fn timestamped_path(dir: &Path, prefix: &str, ext: &str) -> PathBuf {
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    dir.join(format!("{}_{}.{}", prefix, stamp, ext))
}

/// Writes the ranked roster as CSV: rank, name, every configured metric in
/// declared order, the OCR-read rank, and the mismatch flag.
pub fn write_roster_csv(
    path: &Path,
    members: &[RankedMember],
    config: &RosterConfig,
) -> Result<()> {
    let metric_names = config.metric_names();

    let mut file = File::create(path)
        .context(format!("Failed to create roster CSV: {}", path.display()))?;

    let mut header = vec!["rank".to_string(), "name".to_string()];
    header.extend(metric_names.iter().map(|n| n.to_string()));
    header.push("read_rank".to_string());
    header.push("rank_mismatch".to_string());
    writeln!(file, "{}", header.join(",")).context("Failed to write roster CSV header")?;

    for member in members {
        let mut fields = vec![
            member.rank.to_string(),
            csv_field(&member.record.canonical_name),
        ];
        for name in &metric_names {
            fields.push(
                member
                    .record
                    .metrics
                    .get(*name)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        fields.push(
            member
                .record
                .read_rank
                .map(|r| r.to_string())
                .unwrap_or_default(),
        );
        fields.push(member.rank_mismatch.to_string());
        writeln!(file, "{}", fields.join(",")).context("Failed to write roster CSV row")?;
    }

    crate::log(&format!(
        "Wrote roster CSV ({} members): {}",
        members.len(),
        path.display()
    ));
    Ok(())
}

/// Writes the ranked roster as a plain HTML table.
pub fn write_roster_html(
    path: &Path,
    members: &[RankedMember],
    config: &RosterConfig,
) -> Result<()> {
    let metric_names = config.metric_names();

    let mut header_cells = String::from("<th>Rank</th><th>Name</th>");
    for name in &metric_names {
        header_cells.push_str(&format!("<th>{}</th>", escape_html(name)));
    }

    let mut rows = String::new();
    for member in members {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td>",
            member.rank,
            escape_html(&member.record.canonical_name)
        ));
        for name in &metric_names {
            let value = member
                .record
                .metrics
                .get(*name)
                .map(|v| v.to_string())
                .unwrap_or_default();
            rows.push_str(&format!("<td>{}</td>", value));
        }
        rows.push_str("</tr>\n");
    }

    let html = format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>Alliance Roster</title></head>\n\
         <body>\n<table border=\"1\">\n<tr>{}</tr>\n{}</table>\n</body></html>\n",
        header_cells, rows
    );

    std::fs::write(path, html)
        .context(format!("Failed to write roster HTML: {}", path.display()))?;
    crate::log(&format!("Wrote roster HTML: {}", path.display()));
    Ok(())
}

/// Writes every candidate row, valid and invalid, as a debug CSV for human
/// spot-checking of the OCR and the fuzzy merges.
pub fn write_raw_debug(path: &Path, rows: &[CandidateRow]) -> Result<()> {
    let mut file = File::create(path)
        .context(format!("Failed to create debug CSV: {}", path.display()))?;

    writeln!(file, "category,scan,capture,confidence,status,raw_text")
        .context("Failed to write debug CSV header")?;

    for row in rows {
        let status = match row.status {
            RowStatus::Valid => "valid".to_string(),
            RowStatus::Invalid(reason) => format!("invalid:{:?}", reason),
        };
        writeln!(
            file,
            "{},{},{},{:.2},{},{}",
            csv_field(&row.raw.category),
            row.raw.scan_index,
            row.raw.capture_order,
            row.raw.confidence,
            status,
            csv_field(&row.raw.text),
        )
        .context("Failed to write debug CSV row")?;
    }

    crate::log(&format!(
        "Wrote raw debug dump ({} rows): {}",
        rows.len(),
        path.display()
    ));
    Ok(())
}

/// Writes the scan and merge reports as pretty-printed JSON.
pub fn write_report_json(path: &Path, reconciliation: &Reconciliation) -> Result<()> {
    #[derive(serde::Serialize)]
    struct Reports<'a> {
        scan_reports: &'a [crate::reconcile::ScanReport],
        merge_report: &'a crate::reconcile::MergeReport,
        member_count: usize,
    }

    let json = serde_json::to_string_pretty(&Reports {
        scan_reports: &reconciliation.scan_reports,
        merge_report: &reconciliation.merge_report,
        member_count: reconciliation.members.len(),
    })
    .context("Failed to serialize reconciliation report")?;

    std::fs::write(path, json)
        .context(format!("Failed to write report JSON: {}", path.display()))?;
    Ok(())
}

/// Quotes a CSV field when it contains a comma, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
