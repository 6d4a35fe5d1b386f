#[path = "../common/mod.rs"]
mod common;

use common::{
    create_base_workbook, entry_compression, new_workbook_path, read_entry_bytes, read_entry_text,
    run_overwrite, write_workbook_with_entries, CONTENT_TYPES_XML, ROOT_RELS_XML, SHEET1_XML,
    WORKBOOK_RELS_XML, WORKBOOK_XML,
};
use serde_json::json;
use xlsx_overwrite::xlsx::change_set::ChangePayload;
use zip::CompressionMethod;

#[test]
fn applies_change_and_reports_success() {
    let (_dir, file_path) = new_workbook_path("apply.xlsx");
    create_base_workbook(&file_path);

    let report = run_overwrite(
        &file_path,
        json!({
            "changes": [{
                "sheetName": "Sheet1",
                "sourceAddress": "B2",
                "beforeName": "Old",
                "afterName": "New",
                "tableIndex": 0,
                "target": "column"
            }]
        }),
    )
    .expect("overwrite");

    assert_eq!(report.applied_count, 1);
    assert!(report.issues.is_empty());

    let sheet = read_entry_text(&file_path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("inlineStr"));
    assert!(sheet.contains("New"));
    assert!(!sheet.contains(">Old<"));
}

#[test]
fn shared_string_cell_is_validated_and_rewritten_inline() {
    let (_dir, file_path) = new_workbook_path("shared.xlsx");
    create_base_workbook(&file_path);
    let shared_before = read_entry_bytes(&file_path, "xl/sharedStrings.xml");

    let report = run_overwrite(
        &file_path,
        json!({
            "changes": [{
                "sheetName": "Sheet1",
                "sourceAddress": "A1",
                "beforeName": "Alpha",
                "afterName": "Beta"
            }]
        }),
    )
    .expect("overwrite");

    assert_eq!(report.applied_count, 1);
    let sheet = read_entry_text(&file_path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("Beta"));
    // The shared-string table itself is never rewritten.
    assert_eq!(
        read_entry_bytes(&file_path, "xl/sharedStrings.xml"),
        shared_before
    );
}

#[test]
fn value_mismatch_reports_issue_and_keeps_cell_content() {
    let (_dir, file_path) = new_workbook_path("mismatch.xlsx");
    create_base_workbook(&file_path);

    let report = run_overwrite(
        &file_path,
        json!({
            "changes": [{
                "sheetName": "Sheet1",
                "sourceAddress": "B2",
                "beforeName": "Expected",
                "afterName": "New"
            }]
        }),
    )
    .expect("overwrite");

    assert_eq!(report.applied_count, 0);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(
        report.issues[0].reason,
        r#"Cell value mismatch. expected="Expected" actual="Old""#
    );

    let sheet = read_entry_text(&file_path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("Old"));
    assert!(!sheet.contains("New"));
}

#[test]
fn rewriting_to_current_value_still_counts_as_applied() {
    let (_dir, file_path) = new_workbook_path("idempotent.xlsx");
    create_base_workbook(&file_path);

    let report = run_overwrite(
        &file_path,
        json!({
            "changes": [{
                "sheetName": "Sheet1",
                "sourceAddress": "B2",
                "beforeName": "SomethingStale",
                "afterName": "Old"
            }]
        }),
    )
    .expect("overwrite");

    assert_eq!(report.applied_count, 1);
    assert!(report.issues.is_empty());
    let sheet = read_entry_text(&file_path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("Old"));
}

#[test]
fn untouched_entries_survive_byte_identical() {
    let (_dir, file_path) = new_workbook_path("fidelity.xlsx");
    create_base_workbook(&file_path);

    let styles_before = read_entry_bytes(&file_path, "xl/styles.xml");
    let workbook_before = read_entry_bytes(&file_path, "xl/workbook.xml");
    let sheet2_before = read_entry_bytes(&file_path, "xl/worksheets/sheet2.xml");

    run_overwrite(
        &file_path,
        json!({
            "changes": [{
                "sheetName": "Sheet1",
                "sourceAddress": "B2",
                "beforeName": "Old",
                "afterName": "New"
            }]
        }),
    )
    .expect("overwrite");

    assert_eq!(read_entry_bytes(&file_path, "xl/styles.xml"), styles_before);
    assert_eq!(
        read_entry_bytes(&file_path, "xl/workbook.xml"),
        workbook_before
    );
    assert_eq!(
        read_entry_bytes(&file_path, "xl/worksheets/sheet2.xml"),
        sheet2_before
    );
    // Stored entries stay stored after the raw copy.
    assert_eq!(
        entry_compression(&file_path, "xl/styles.xml"),
        CompressionMethod::Stored
    );
}

#[test]
fn unknown_sheet_name_is_rejected_without_touching_the_file() {
    let (_dir, file_path) = new_workbook_path("unknown_sheet.xlsx");
    create_base_workbook(&file_path);
    let original = std::fs::read(&file_path).expect("read workbook");

    let report = run_overwrite(
        &file_path,
        json!({
            "changes": [{
                "sheetName": "NoSuchSheet",
                "sourceAddress": "A1",
                "beforeName": "Old",
                "afterName": "New"
            }]
        }),
    )
    .expect("overwrite");

    assert_eq!(report.applied_count, 0);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].reason, "Worksheet not found in workbook");
    // No worksheet was touched, so the archive is not rewritten at all.
    assert_eq!(std::fs::read(&file_path).expect("reread"), original);
}

#[test]
fn missing_worksheet_entry_reports_zip_issue() {
    let (_dir, file_path) = new_workbook_path("missing_entry.xlsx");
    // rId2 resolves to xl/worksheets/sheet2.xml, which is not in the archive.
    write_workbook_with_entries(
        &file_path,
        &[
            ("[Content_Types].xml", CONTENT_TYPES_XML),
            ("_rels/.rels", ROOT_RELS_XML),
            ("xl/workbook.xml", WORKBOOK_XML),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML),
            ("xl/worksheets/sheet1.xml", SHEET1_XML),
        ],
    );

    let report = run_overwrite(
        &file_path,
        json!({
            "changes": [{
                "sheetName": "Second",
                "sourceAddress": "A1",
                "beforeName": "Other",
                "afterName": "New"
            }]
        }),
    )
    .expect("overwrite");

    assert_eq!(report.applied_count, 0);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(
        report.issues[0].reason,
        "Worksheet xml entry not found in workbook zip"
    );
}

#[test]
fn invalid_address_reports_parse_issue() {
    let (_dir, file_path) = new_workbook_path("bad_address.xlsx");
    create_base_workbook(&file_path);

    let report = run_overwrite(
        &file_path,
        json!({
            "changes": [{
                "sheetName": "Sheet1",
                "sourceAddress": "2B",
                "beforeName": "Old",
                "afterName": "New"
            }]
        }),
    )
    .expect("overwrite");

    assert_eq!(report.applied_count, 0);
    assert_eq!(report.issues.len(), 1);
    assert!(report.issues[0].reason.contains("invalid cell address"));
}

#[test]
fn changes_are_grouped_per_worksheet() {
    let (_dir, file_path) = new_workbook_path("grouped.xlsx");
    create_base_workbook(&file_path);

    let report = run_overwrite(
        &file_path,
        json!({
            "changes": [
                {
                    "sheetName": "Sheet1",
                    "sourceAddress": "B2",
                    "beforeName": "Old",
                    "afterName": "New"
                },
                {
                    "sheetName": "Second",
                    "sourceAddress": "A1",
                    "beforeName": "Other",
                    "afterName": "Changed"
                },
                {
                    "sheetName": "Ghost",
                    "sourceAddress": "A1",
                    "beforeName": "x",
                    "afterName": "y"
                }
            ]
        }),
    )
    .expect("overwrite");

    assert_eq!(report.applied_count, 2);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].sheet_name, "Ghost");

    assert!(read_entry_text(&file_path, "xl/worksheets/sheet1.xml").contains("New"));
    assert!(read_entry_text(&file_path, "xl/worksheets/sheet2.xml").contains("Changed"));
}

#[test]
fn report_serializes_with_wire_field_names() {
    let (_dir, file_path) = new_workbook_path("report_shape.xlsx");
    create_base_workbook(&file_path);

    let report = run_overwrite(
        &file_path,
        json!({
            "changes": [{
                "sheetName": "Ghost",
                "sourceAddress": "A1",
                "beforeName": "x",
                "afterName": "y"
            }]
        }),
    )
    .expect("overwrite");

    let value = serde_json::to_value(&report).expect("serialize report");
    assert_eq!(value["appliedCount"], 0);
    assert_eq!(value["issues"][0]["sheetName"], "Ghost");
    assert_eq!(value["issues"][0]["sourceAddress"], "A1");
    assert_eq!(value["issues"][0]["tableIndex"], -1);
    assert_eq!(value["issues"][0]["columnIndex"], serde_json::Value::Null);
    assert_eq!(value["issues"][0]["target"], "column");
}

#[test]
fn explicit_table_target_round_trips_into_issues() {
    let (_dir, file_path) = new_workbook_path("table_target.xlsx");
    create_base_workbook(&file_path);

    let report = run_overwrite(
        &file_path,
        json!({
            "changes": [{
                "sheetName": "Ghost",
                "sourceAddress": "A1",
                "beforeName": "x",
                "afterName": "y",
                "tableIndex": 3,
                "columnIndex": 7,
                "target": "table"
            }]
        }),
    )
    .expect("overwrite");

    let value = serde_json::to_value(&report).expect("serialize report");
    assert_eq!(value["issues"][0]["tableIndex"], 3);
    assert_eq!(value["issues"][0]["columnIndex"], 7);
    assert_eq!(value["issues"][0]["target"], "table");
}

#[test]
fn non_xlsx_extension_is_fatal() {
    let (_dir, file_path) = new_workbook_path("workbook.ods");
    create_base_workbook(&file_path);

    let err = run_overwrite(&file_path, json!({ "changes": [] })).expect_err("must fail");
    assert!(err.to_string().contains("expected .xlsx extension"));
}

#[test]
fn missing_workbook_file_is_fatal() {
    let (_dir, file_path) = new_workbook_path("absent.xlsx");

    let err = run_overwrite(&file_path, json!({ "changes": [] })).expect_err("must fail");
    assert!(err.to_string().contains("file not found"));
}

#[test]
fn worksheet_without_sheet_data_aborts_and_leaves_file_untouched() {
    let (_dir, file_path) = new_workbook_path("no_sheet_data.xlsx");
    let broken_sheet = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><dimension ref="A1"/></worksheet>"#;
    write_workbook_with_entries(
        &file_path,
        &[
            ("[Content_Types].xml", CONTENT_TYPES_XML),
            ("_rels/.rels", ROOT_RELS_XML),
            ("xl/workbook.xml", WORKBOOK_XML),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML),
            ("xl/worksheets/sheet1.xml", broken_sheet),
            ("xl/worksheets/sheet2.xml", SHEET1_XML),
        ],
    );
    let original = std::fs::read(&file_path).expect("read workbook");

    let err = run_overwrite(
        &file_path,
        json!({
            "changes": [{
                "sheetName": "Sheet1",
                "sourceAddress": "A1",
                "beforeName": "",
                "afterName": "X"
            }]
        }),
    )
    .expect_err("must fail");

    assert!(err.to_string().contains("sheetData"));
    assert_eq!(std::fs::read(&file_path).expect("reread"), original);
}

#[test]
fn payload_changes_must_be_a_sequence() {
    assert!(serde_json::from_value::<ChangePayload>(json!({ "changes": 5 })).is_err());
    assert!(serde_json::from_value::<ChangePayload>(json!({ "changes": {} })).is_err());

    let empty: ChangePayload = serde_json::from_value(json!({})).expect("missing changes is fine");
    assert!(empty.changes.is_empty());
}

#[test]
fn empty_change_list_reports_zero_applied() {
    let (_dir, file_path) = new_workbook_path("empty.xlsx");
    create_base_workbook(&file_path);
    let original = std::fs::read(&file_path).expect("read workbook");

    let report = run_overwrite(&file_path, json!({ "changes": [] })).expect("overwrite");
    assert_eq!(report.applied_count, 0);
    assert!(report.issues.is_empty());
    assert_eq!(std::fs::read(&file_path).expect("reread"), original);
}
