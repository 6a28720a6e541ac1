//! Integration tests for loading documents from JSON.

use std::fs;

use docrender::ops::{Limit, Sort};
use docrender::render::{to_markdown, to_text};
use docrender::{load_file, load_reader, load_str, ContentBody, Error, RenderOptions};
use serde_json::json;
use tempfile::TempDir;

const INVENTORY: &str = r#"{
    "title": "Inventory",
    "created": "2024-05-01T12:00:00Z",
    "metadata": {"author": "ops", "site": "north"},
    "contents": [
        {"type": "text", "id": "intro", "text": "Stock levels", "heading_level": 2},
        {"type": "table", "id": "stock", "schema": ["item", "qty"], "caption": "Current stock",
         "rows": [{"item": "bolt", "qty": 40}, ["nut", 12], {"item": "washer"}]},
        {"type": "section", "id": "details", "title": "Details", "children": [
            {"type": "chart", "title": "Usage", "kind": "line", "labels": ["mon", "tue"],
             "series": [{"name": "bolts", "values": [3, 4.5]}]},
            {"type": "graph", "edges": [{"from": "depot", "to": "shop", "label": "truck"}]},
            {"type": "diagram", "syntax": "plantuml", "source": "@startuml\nA -> B\n@enduml"}
        ]},
        {"type": "collapsible", "summary": "Raw data", "expanded": true, "children": [
            {"type": "raw", "format": "csv", "data": "item,qty\nbolt,40"}
        ]}
    ]
}"#;

#[test]
fn test_load_all_content_kinds() {
    let doc = load_str(INVENTORY).unwrap();

    assert_eq!(doc.title(), Some("Inventory"));
    assert_eq!(doc.get_metadata("site"), Some("north"));
    assert_eq!(doc.len(), 4);
    assert_eq!(doc.total_items(), 8);

    let kinds: Vec<_> = doc.contents().iter().map(|c| c.kind()).collect();
    assert_eq!(kinds, vec!["text", "table", "section", "collapsible"]);

    let details = doc.find("details").unwrap();
    let child_kinds: Vec<_> = details.children().iter().map(|c| c.kind()).collect();
    assert_eq!(child_kinds, vec!["chart", "graph", "diagram"]);
    assert_eq!(details.children()[1].id(), "3.2");

    match details.children()[0].body() {
        ContentBody::Chart(chart) => assert_eq!(chart.series[0].values, vec![3.0, 4.5]),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_load_file_then_attach_operations() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("inventory.json");
    fs::write(&path, INVENTORY).unwrap();

    let doc = load_file(&path).unwrap();
    let stock = doc
        .find("stock")
        .unwrap()
        .clone()
        .with_operation(Sort::descending("qty"))
        .with_operation(Limit::new(1));
    let table = docrender::apply_transformations(&docrender::Context::background(), &stock)
        .unwrap()
        .as_table()
        .unwrap()
        .clone();

    assert_eq!(table.row_count(), 1);
    assert_eq!(table.get(0, "item"), Some(&json!("bolt")));
}

#[test]
fn test_loaded_document_renders() {
    let doc = load_reader(INVENTORY.as_bytes()).unwrap();

    let markdown = to_markdown(&doc, &RenderOptions::default()).unwrap();
    assert!(markdown.contains("## Stock levels"));
    assert!(markdown.contains("**Current stock**"));
    assert!(markdown.contains("| washer |  |"));
    assert!(markdown.contains("```plantuml\n@startuml"));
    assert!(markdown.contains("<details open>"));

    let text = to_text(&doc, &RenderOptions::default()).unwrap();
    assert!(text.contains("depot -> shop (truck)"));
    assert!(text.contains("mon: bolts=3"));
}

#[test]
fn test_unknown_schema_column_is_invalid() {
    let err = load_str(
        r#"{"contents": [{"type": "table", "id": "t", "schema": ["a"], "rows": [{"b": 1}]}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidDocument(_)));
    assert!(err.to_string().contains("table 't'"));
}

#[test]
fn test_unknown_top_level_field_is_rejected() {
    assert!(matches!(load_str(r#"{"pages": []}"#), Err(Error::Json(_))));
}
