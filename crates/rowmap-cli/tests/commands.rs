//! Command-level tests over temporary rules and CSV files.

use std::fs;
use std::path::Path;

use rowmap_cli::cli::{InputArgs, InspectArgs, MapArgs, OutputFormatArg};
use rowmap_cli::commands::{run_inspect, run_map};
use rowmap_cli::summary::{json_lines, records_table};

const RULES: &str = r#"{
    "target": "Shipment",
    "command": "shipments-cli-test",
    "properties": [
        { "name": "Id", "kind": "int", "alias": "shipment_id" },
        { "name": "Carrier", "kind": "text", "processors": ["trim", "uppercase"] },
        { "name": "Weight", "kind": "float" },
        { "name": "Fragile", "kind": "bool", "alias": "is_fragile" }
    ]
}"#;

const CSV: &str = "shipment_id,Carrier,Weight,Notes\n\
                   1,acme,2.5,first\n\
                   2, globex ,,second\n";

fn input(dir: &Path) -> InputArgs {
    let rules = dir.join("rules.json");
    let input = dir.join("shipments.csv");
    fs::write(&rules, RULES).expect("write rules");
    fs::write(&input, CSV).expect("write csv");
    InputArgs {
        rules,
        input,
        delimiter: ',',
        no_trim: false,
        keep_empty: false,
    }
}

#[test]
fn inspect_reports_bindings_against_header() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = run_inspect(&InspectArgs {
        input: input(dir.path()),
    })
    .expect("inspect");

    assert_eq!(result.target, "Shipment");
    assert_eq!(result.command, "shipments-cli-test");
    assert_eq!(result.fingerprint.len(), 32);
    assert_eq!(result.columns, vec!["shipment_id", "Carrier", "Weight", "Notes"]);
    insta::assert_json_snapshot!(result.bindings, @r#"
    [
      {
        "property": "Id",
        "alias": "shipment_id",
        "kind": "int",
        "ordinal": 0,
        "processors": []
      },
      {
        "property": "Carrier",
        "alias": "Carrier",
        "kind": "text",
        "ordinal": 1,
        "processors": [
          "trim",
          "uppercase"
        ]
      },
      {
        "property": "Weight",
        "alias": "Weight",
        "kind": "float",
        "ordinal": 2,
        "processors": []
      },
      {
        "property": "Fragile",
        "alias": "is_fragile",
        "kind": "bool",
        "ordinal": null,
        "processors": []
      }
    ]
    "#);
}

#[test]
fn map_prints_one_json_object_per_row() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = run_map(&MapArgs {
        input: input(dir.path()),
        strict: false,
        format: OutputFormatArg::Json,
    })
    .expect("map");

    assert_eq!(result.properties, vec!["Id", "Carrier", "Weight", "Fragile"]);
    let lines = json_lines(&result).expect("json");
    insta::assert_snapshot!(lines.join("\n"), @r#"
    {"Id":1,"Carrier":"ACME","Weight":2.5}
    {"Id":2,"Carrier":"GLOBEX"}
    "#);
    assert_eq!(records_table(&result).row_iter().count(), 2);
}

#[test]
fn strict_map_fails_with_descriptive_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = run_map(&MapArgs {
        input: input(dir.path()),
        strict: true,
        format: OutputFormatArg::Table,
    })
    .expect_err("is_fragile column is absent");

    let message = format!("{err:#}");
    assert!(message.starts_with("map rows of "), "{message}");
    assert!(
        message.contains("Fragile encountered an error on column [is_fragile]"),
        "{message}"
    );
    assert!(message.contains("of Shipment (bool) at row 0"), "{message}");
}

#[test]
fn unreadable_rules_file_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut args = input(dir.path());
    args.rules = dir.path().join("missing.json");
    let err = run_inspect(&InspectArgs { input: args }).expect_err("missing rules");
    assert!(format!("{err:#}").contains("load rules file"));
}

#[test]
fn non_ascii_delimiter_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut args = input(dir.path());
    args.delimiter = '→';
    let err = run_inspect(&InspectArgs { input: args }).expect_err("bad delimiter");
    assert!(err.to_string().contains("ASCII"));
}
