//! Grouped console report and the timestamped JSON dump.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use tracing::{info, instrument};

use crate::cases::{CaseRecord, ResultSet};
use crate::error::{Error, Result};

/// Label for records without a status.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Descriptions longer than this many characters are cut.
pub const DESCRIPTION_LIMIT: usize = 100;

const NOT_AVAILABLE: &str = "N/A";

/// An 80-column rule of `ch`.
pub fn rule(ch: char) -> String {
    std::iter::repeat(ch).take(80).collect()
}

/// Run header: the instance being queried and the window.
pub fn render_banner(out: &mut impl Write, instance_url: &str, days: u32) -> std::io::Result<()> {
    let heavy = rule('=');
    writeln!(out, "\n{heavy}")?;
    writeln!(out, "SALESFORCE SSO INTEGRATION SERVICE CASES")?;
    writeln!(out, "{heavy}")?;
    writeln!(out, "Instance: {instance_url}")?;
    writeln!(out, "Days: {days}")?;
    writeln!(out, "{heavy}\n")
}

/// Group records by status, labels sorted. Record order inside a group is
/// the query order.
pub fn group_by_status(records: &[CaseRecord]) -> BTreeMap<&str, Vec<&CaseRecord>> {
    let mut groups: BTreeMap<&str, Vec<&CaseRecord>> = BTreeMap::new();
    for record in records {
        let status = record.status.as_deref().unwrap_or(UNKNOWN_STATUS);
        groups.entry(status).or_default().push(record);
    }
    groups
}

/// Cut a description to [`DESCRIPTION_LIMIT`] characters, adding `...`
/// when anything was dropped.
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_LIMIT {
        let mut cut: String = description.chars().take(DESCRIPTION_LIMIT).collect();
        cut.push_str("...");
        cut
    } else {
        description.to_string()
    }
}

/// Write the grouped report.
pub fn render_report(out: &mut impl Write, result: &ResultSet, days: u32) -> std::io::Result<()> {
    let heavy = rule('=');
    writeln!(out, "\n{heavy}")?;
    writeln!(out, "Integration Service Cases - Last {days} Day(s)")?;
    writeln!(out, "Total Cases Found: {}", result.total_size)?;
    writeln!(out, "{heavy}\n")?;

    if result.is_empty() {
        writeln!(out, "No cases found.")?;
        return Ok(());
    }

    let light = rule('-');
    for (status, cases) in group_by_status(&result.records) {
        writeln!(out, "\n## {status} ({} case(s))", cases.len())?;
        writeln!(out, "{light}")?;
        for case in cases {
            render_case(out, case)?;
        }
    }
    Ok(())
}

fn render_case(out: &mut impl Write, case: &CaseRecord) -> std::io::Result<()> {
    writeln!(out, "  Case: {}", case.case_number)?;
    writeln!(
        out,
        "  Subject: {}",
        case.subject.as_deref().unwrap_or(NOT_AVAILABLE)
    )?;
    writeln!(
        out,
        "  Priority: {}",
        case.priority.as_deref().unwrap_or(NOT_AVAILABLE)
    )?;
    writeln!(out, "  Created: {}", case.created_date)?;
    writeln!(
        out,
        "  Owner: {}",
        case.owner_name().unwrap_or(NOT_AVAILABLE)
    )?;
    if case.account.is_some() {
        writeln!(
            out,
            "  Account: {}",
            case.account_name().unwrap_or(NOT_AVAILABLE)
        )?;
    }
    if let Some(description) = case.description.as_deref().filter(|d| !d.is_empty()) {
        writeln!(out, "  Description: {}", truncate_description(description))?;
    }
    writeln!(out)
}

/// `salesforce_cases_<YYYYMMDD_HHMMSS>.json` for the given instant.
pub fn results_file_name<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("salesforce_cases_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Persist the full records as pretty-printed JSON in `dir`.
///
/// Returns the path written.
#[instrument(skip(records, now), fields(count = records.len()))]
pub fn write_results<Tz>(dir: &Path, records: &[CaseRecord], now: &DateTime<Tz>) -> Result<PathBuf>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let path = dir.join(results_file_name(now));
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;

    info!(path = %path.display(), "Results saved");
    Ok(path)
}

/// Footer naming the saved file.
pub fn render_saved(out: &mut impl Write, path: &Path) -> std::io::Result<()> {
    let heavy = rule('=');
    writeln!(out, "\n{heavy}")?;
    writeln!(out, "Results saved to: {}", path.display())?;
    writeln!(out, "{heavy}\n")
}

/// A failure message: the headline first, then one line per cause.
pub fn failure_lines(headline: &str, err: &Error) -> Vec<String> {
    let chain = err.chain();
    let Some((message, causes)) = chain.split_first() else {
        return vec![format!("✗ {headline}")];
    };
    std::iter::once(format!("✗ {headline}: {message}"))
        .chain(causes.iter().map(|cause| format!("  caused by: {cause}")))
        .collect()
}
