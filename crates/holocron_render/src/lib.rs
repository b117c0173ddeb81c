use std::collections::BTreeMap;
use std::fmt::Write as _;

use holocron_core::core_api::{CoreError, RecordType, ScanReport, TargetRecord};
use serde_json::{Map as JsonMap, Value as JsonValue};

const TYPE_COL_WIDTH: usize = 22;
const COUNT_COL_WIDTH: usize = 8;
const NAME_COL_WIDTH: usize = 36;
const CATEGORY_COL_WIDTH: usize = 34;
const ISSUE_PREVIEW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    RealmV1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRenderOptions {
    pub verbose: bool,
}

/// One converted record with the envelope keys in upload order.
pub fn render_record_json(record: &TargetRecord, style: JsonStyle) -> JsonValue {
    match style {
        JsonStyle::RealmV1 => JsonValue::Object(record_json(record)),
    }
}

pub fn render_records_json(records: &[TargetRecord], style: JsonStyle) -> JsonValue {
    JsonValue::Array(
        records
            .iter()
            .map(|record| render_record_json(record, style))
            .collect(),
    )
}

/// Counts for every record type, zero included, in the fixed type order.
pub fn render_counts_json(counts: &BTreeMap<RecordType, usize>) -> JsonValue {
    let mut out = JsonMap::new();
    for kind in RecordType::ALL {
        out.insert(
            kind.as_str().to_string(),
            JsonValue::from(counts.get(&kind).copied().unwrap_or(0)),
        );
    }
    JsonValue::Object(out)
}

pub fn render_scan_json(report: &ScanReport) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "files_seen".to_string(),
        JsonValue::from(report.files_seen),
    );
    out.insert("total".to_string(), JsonValue::from(report.total()));
    out.insert("counts".to_string(), render_counts_json(&report.counts()));
    out.insert(
        "issues".to_string(),
        JsonValue::Array(report.issues.iter().map(issue_to_json).collect()),
    );
    JsonValue::Object(out)
}

fn record_json(record: &TargetRecord) -> JsonMap<String, JsonValue> {
    let mut out = JsonMap::new();
    out.insert("name".to_string(), JsonValue::String(record.name.clone()));
    out.insert(
        "recordType".to_string(),
        JsonValue::String(record.record_type.as_str().to_string()),
    );
    out.insert(
        "campaignId".to_string(),
        JsonValue::String(record.campaign_id.clone()),
    );
    out.insert(
        "category".to_string(),
        JsonValue::String(record.category.clone()),
    );
    out.insert("identified".to_string(), JsonValue::Bool(record.identified));
    out.insert("shared".to_string(), JsonValue::Bool(record.shared));
    out.insert("locked".to_string(), JsonValue::Bool(record.locked));
    out.insert("data".to_string(), JsonValue::Object(record.data.clone()));
    out.insert(
        "fields".to_string(),
        JsonValue::Object(record.fields.clone()),
    );
    out
}

fn issue_to_json(issue: &CoreError) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "code".to_string(),
        JsonValue::String(format!("{:?}", issue.code)),
    );
    out.insert(
        "message".to_string(),
        JsonValue::String(issue.message.clone()),
    );
    JsonValue::Object(out)
}

/// Plain-text scan summary: a count table, then problems. Without
/// `verbose` only the first few problems are listed.
pub fn render_scan_summary(report: &ScanReport, options: TextRenderOptions) -> String {
    let mut out = String::new();
    writeln!(out, "Files scanned: {}", report.files_seen).expect("writing to String cannot fail");
    writeln!(out).expect("writing to String cannot fail");

    let counts = report.counts();
    writeln!(
        out,
        "{:<tw$}{:>cw$}",
        "Record type",
        "Count",
        tw = TYPE_COL_WIDTH,
        cw = COUNT_COL_WIDTH
    )
    .expect("writing to String cannot fail");
    for kind in RecordType::ALL {
        let count = counts.get(&kind).copied().unwrap_or(0);
        if count == 0 && !options.verbose {
            continue;
        }
        writeln!(
            out,
            "{:<tw$}{:>cw$}",
            clip_cell(kind.as_str(), TYPE_COL_WIDTH),
            group_thousands(count),
            tw = TYPE_COL_WIDTH,
            cw = COUNT_COL_WIDTH
        )
        .expect("writing to String cannot fail");
    }
    writeln!(
        out,
        "{:<tw$}{:>cw$}",
        "total",
        group_thousands(report.total()),
        tw = TYPE_COL_WIDTH,
        cw = COUNT_COL_WIDTH
    )
    .expect("writing to String cannot fail");

    if !report.issues.is_empty() {
        writeln!(out).expect("writing to String cannot fail");
        writeln!(out, "Problems: {}", report.issues.len()).expect("writing to String cannot fail");
        let shown = if options.verbose {
            report.issues.len()
        } else {
            ISSUE_PREVIEW
        };
        for issue in report.issues.iter().take(shown) {
            writeln!(out, "  {issue}").expect("writing to String cannot fail");
        }
        if report.issues.len() > shown {
            writeln!(out, "  ... {} more (use -v)", report.issues.len() - shown)
                .expect("writing to String cannot fail");
        }
    }
    out
}

/// One line per converted record: type, name and category.
pub fn render_records_text(records: &[TargetRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let line = format!(
            "{:<tw$}{:<nw$}{:<cw$}",
            clip_cell(record.record_type.as_str(), TYPE_COL_WIDTH),
            clip_cell(&record.name, NAME_COL_WIDTH),
            clip_cell(&record.category, CATEGORY_COL_WIDTH),
            tw = TYPE_COL_WIDTH,
            nw = NAME_COL_WIDTH,
            cw = CATEGORY_COL_WIDTH
        );
        writeln!(out, "{}", line.trim_end()).expect("writing to String cannot fail");
    }
    out
}

/// Cell text for the record and count tables. Never longer than `width`
/// characters; a clipped cell ends in "... " so the next column stays apart.
fn clip_cell(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len <= width {
        return value.to_string();
    }
    match width {
        0..=3 => value.chars().take(width).collect(),
        _ => {
            let kept: String = value.chars().take(width - 4).collect();
            format!("{kept}... ")
        }
    }
}

/// Record counts with thousands grouping, e.g. 12,345 talents.
fn group_thousands(count: usize) -> String {
    let digits = count.to_string();
    let lead = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.char_indices() {
        if i > 0 && i % 3 == lead {
            out.push(',');
        }
        out.push(digit);
    }
    out
}
