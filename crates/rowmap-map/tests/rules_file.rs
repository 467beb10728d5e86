//! Rules files driving dynamic records over CSV input.

use std::fs;

use rowmap_ingest::{CsvCursor, CsvOptions};
use rowmap_map::{ConfigurationError, ProjectorCache, RulesFile, map};
use rowmap_model::Value;

const RULES: &str = r#"{
    "target": "Customer",
    "command": "customers-import",
    "properties": [
        { "name": "Id", "kind": "int" },
        { "name": "Name", "kind": "text", "processors": ["uppercase"] },
        { "name": "Active", "kind": "bool", "alias": "is_active" },
        { "name": "Score", "kind": "float", "alias": "rating" }
    ]
}"#;

#[test]
fn maps_csv_rows_into_dynamic_records() {
    let dir = tempfile::tempdir().expect("temp dir");
    let rules_path = dir.path().join("customers.json");
    let csv_path = dir.path().join("customers.csv");
    fs::write(&rules_path, RULES).expect("write rules");
    fs::write(&csv_path, "Id,Name,IS_ACTIVE\n1, ada ,yes\n2,bob,\n").expect("write csv");

    let file = RulesFile::load(&rules_path).expect("load rules");
    let rules = file.rule_set(false).expect("rule set");
    let cache = ProjectorCache::new();
    let projector = cache
        .compile_or_fetch(&rules, &file.command_id())
        .expect("compile");
    let cursor = CsvCursor::from_path(&csv_path, CsvOptions::default()).expect("open csv");
    let records = map(cursor, &projector).expect("map");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("Id"), Some(&Value::Int(1)));
    assert_eq!(records[0].get("Name"), Some(&Value::text("ADA")));
    assert_eq!(records[0].get("Active"), Some(&Value::Bool(true)));
    assert_eq!(records[0].get("Score"), None);
    assert_eq!(records[1].get("Active"), None);
    assert_eq!(
        serde_json::to_string(&records[1]).expect("json"),
        r#"{"Id":2,"Name":"BOB"}"#
    );
}

#[test]
fn strict_rules_report_missing_columns() {
    let dir = tempfile::tempdir().expect("temp dir");
    let csv_path = dir.path().join("customers.csv");
    fs::write(&csv_path, "Id,Name,is_active\n1,ada,no\n").expect("write csv");

    let file = RulesFile::from_json(RULES).expect("parse rules");
    let rules = file.rule_set(true).expect("rule set");
    let projector = ProjectorCache::new()
        .compile_or_fetch(&rules, &file.command_id())
        .expect("compile");
    let cursor = CsvCursor::from_path(&csv_path, CsvOptions::default()).expect("open csv");
    let err = map(cursor, &projector).expect_err("rating column is absent");
    let failure = err.as_binding().expect("binding failure");
    assert_eq!(failure.property, "Score");
    assert_eq!(failure.alias, "rating");
    assert_eq!(failure.target_type, "Customer");
}

#[test]
fn missing_rules_file_is_reported_with_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent.json");
    let err = RulesFile::load(&path).expect_err("missing file");
    assert!(matches!(err, ConfigurationError::RulesFile { .. }));
    assert!(err.to_string().contains("absent.json"));
}
