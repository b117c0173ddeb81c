use std::collections::BTreeMap;

use holocron_core::core_api::{
    CoreError, CoreErrorCode, RecordType, ScanReport, SourceData, SourceRecord, TargetRecord,
};
use holocron_core::oggdude::types::TalentData;
use holocron_render::{
    JsonStyle, TextRenderOptions, render_counts_json, render_record_json, render_records_json,
    render_records_text, render_scan_json, render_scan_summary,
};
use serde_json::json;

fn blaster() -> TargetRecord {
    let mut record = TargetRecord::new(
        "Blaster Pistol",
        RecordType::Items,
        "campaign-1",
        "Edge of the Empire Core Rulebook",
    );
    record.data.insert("type".into(), json!("ranged weapon"));
    record.data.insert("damage".into(), json!(6));
    record
        .fields
        .insert("weaponProperties".into(), json!({ "hidden": false }));
    record
}

fn report() -> ScanReport {
    let talent = SourceRecord::new(
        RecordType::Talents,
        "Grit",
        SourceData::Talent(TalentData::default()),
    );
    let mut records = BTreeMap::new();
    records.insert(RecordType::Talents, vec![talent.clone(), talent]);
    ScanReport {
        records,
        files_seen: 1_250,
        issues: (0..7)
            .map(|i| {
                CoreError::new(
                    CoreErrorCode::MalformedSource,
                    format!("failed to parse Broken{i}.xml"),
                )
            })
            .collect(),
    }
}

#[test]
fn record_json_uses_upload_key_order() {
    let value = render_record_json(&blaster(), JsonStyle::RealmV1);
    let keys: Vec<&str> = value
        .as_object()
        .expect("json should be an object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        keys,
        vec![
            "name",
            "recordType",
            "campaignId",
            "category",
            "identified",
            "shared",
            "locked",
            "data",
            "fields",
        ]
    );
    assert_eq!(value["recordType"], "items");
    assert_eq!(value["data"]["damage"], 6);
}

#[test]
fn talent_without_field_hints_keeps_empty_fields() {
    let record = TargetRecord::new("Grit", RecordType::Talents, "c", "Core");
    let value = render_records_json(&[record], JsonStyle::RealmV1);
    assert_eq!(value.as_array().map(Vec::len), Some(1));
    assert_eq!(value[0]["fields"], json!({}));
    let keys: Vec<&str> = value[0]
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys.last(), Some(&"fields"));
}

#[test]
fn counts_cover_every_type_in_order() {
    let mut counts = BTreeMap::new();
    counts.insert(RecordType::Npcs, 3);
    let value = render_counts_json(&counts);
    let keys: Vec<&str> = value
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys.len(), RecordType::ALL.len());
    assert_eq!(keys[0], "items");
    assert_eq!(value["npcs"], 3);
    assert_eq!(value["talents"], 0);
}

#[test]
fn scan_json_lists_issues() {
    let value = render_scan_json(&report());
    assert_eq!(value["files_seen"], 1250);
    assert_eq!(value["total"], 2);
    assert_eq!(value["counts"]["talents"], 2);
    assert_eq!(value["issues"][0]["code"], "MalformedSource");
    assert_eq!(value["issues"].as_array().map(Vec::len), Some(7));
}

#[test]
fn text_summary_previews_problems() {
    let text = render_scan_summary(&report(), TextRenderOptions::default());
    assert!(text.starts_with("Files scanned: 1250\n"));
    assert!(text.contains("talents"));
    assert!(!text.contains("force_powers"));
    assert!(text.contains("Problems: 7"));
    assert!(text.contains("MalformedSource: failed to parse Broken0.xml"));
    assert!(!text.contains("Broken6.xml"));
    assert!(text.contains("... 2 more (use -v)"));

    let verbose = render_scan_summary(&report(), TextRenderOptions { verbose: true });
    assert!(verbose.contains("force_powers"));
    assert!(verbose.contains("Broken6.xml"));
}

#[test]
fn record_lines_are_trimmed() {
    let text = render_records_text(&[blaster()]);
    assert!(text.starts_with("items"));
    assert!(text.contains("Blaster Pistol"));
    assert!(text.ends_with("Rulebook\n"));
}
