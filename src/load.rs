//! Loading documents from JSON descriptions.
//!
//! ```json
//! {
//!   "title": "Inventory",
//!   "metadata": {"author": "ops"},
//!   "contents": [
//!     {"type": "text", "text": "Stock levels", "heading_level": 1},
//!     {"type": "table", "id": "stock", "schema": ["item", "qty"],
//!      "rows": [{"item": "bolt", "qty": 40}, ["nut", 12]]}
//!   ]
//! }
//! ```
//!
//! Table rows may be objects or arrays in schema order. Content without an
//! `id` is given one from its position (`"3"`, `"3.1"` for nested items).
//! Operations cannot be described in JSON; attach them after loading.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{
    Chart, ChartKind, Content, ContentBody, Diagram, Document, Edge, Graph, Record, Series, Table,
    Text, Value,
};

/// Load a document from a JSON file.
pub fn load_file(path: impl AsRef<Path>) -> Result<Document> {
    let data = fs::read_to_string(path.as_ref())?;
    load_str(&data)
}

/// Load a document from a JSON reader.
pub fn load_reader(mut reader: impl Read) -> Result<Document> {
    let mut data = String::new();
    reader.read_to_string(&mut data)?;
    load_str(&data)
}

/// Load a document from a JSON string.
pub fn load_str(data: &str) -> Result<Document> {
    let spec: DocumentSpec = serde_json::from_str(data)?;
    spec.into_document()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentSpec {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    created: Option<DateTime<Utc>>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    #[serde(default)]
    contents: Vec<ContentSpec>,
}

impl DocumentSpec {
    fn into_document(self) -> Result<Document> {
        let contents = build_all(self.contents, "")?;
        let mut doc = Document::new(contents);
        if let Some(title) = self.title {
            doc = doc.with_title(title);
        }
        if let Some(created) = self.created {
            doc = doc.with_created(created);
        }
        for (key, value) in self.metadata {
            doc = doc.with_metadata(key, value);
        }
        Ok(doc)
    }
}

#[derive(Debug, Deserialize)]
struct ContentSpec {
    #[serde(default)]
    id: Option<String>,
    #[serde(flatten)]
    body: BodySpec,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BodySpec {
    Table {
        schema: Vec<String>,
        #[serde(default)]
        rows: Vec<RowSpec>,
        #[serde(default)]
        caption: Option<String>,
    },
    Text {
        text: String,
        #[serde(default)]
        heading_level: Option<u8>,
    },
    Raw {
        format: String,
        data: String,
    },
    Section {
        title: String,
        #[serde(default)]
        children: Vec<ContentSpec>,
    },
    Chart {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        kind: ChartKind,
        #[serde(default)]
        labels: Vec<String>,
        #[serde(default)]
        series: Vec<Series>,
    },
    Graph {
        #[serde(default)]
        title: Option<String>,
        #[serde(default = "default_directed")]
        directed: bool,
        #[serde(default)]
        edges: Vec<Edge>,
    },
    Diagram {
        #[serde(default)]
        title: Option<String>,
        syntax: String,
        source: String,
    },
    Collapsible {
        summary: String,
        #[serde(default)]
        expanded: bool,
        #[serde(default)]
        children: Vec<ContentSpec>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RowSpec {
    Object(Record),
    Array(Vec<Value>),
}

fn default_directed() -> bool {
    true
}

fn build_all(specs: Vec<ContentSpec>, prefix: &str) -> Result<Vec<Content>> {
    specs
        .into_iter()
        .enumerate()
        .map(|(i, spec)| {
            let position = if prefix.is_empty() {
                (i + 1).to_string()
            } else {
                format!("{}.{}", prefix, i + 1)
            };
            spec.build(&position)
        })
        .collect()
}

impl ContentSpec {
    fn build(self, position: &str) -> Result<Content> {
        let id = self.id.unwrap_or_else(|| position.to_string());
        let body = match self.body {
            BodySpec::Table {
                schema,
                rows,
                caption,
            } => {
                let rows = rows
                    .into_iter()
                    .enumerate()
                    .map(|(i, row)| row.into_record(&id, i, &schema))
                    .collect::<Result<Vec<_>>>()?;
                let mut table = Table::from_rows(schema, rows).map_err(|e| match e {
                    Error::InvalidDocument(msg) => {
                        Error::InvalidDocument(format!("table '{}': {}", id, msg))
                    }
                    other => other,
                })?;
                if let Some(caption) = caption {
                    table = table.with_caption(caption);
                }
                ContentBody::Table(table)
            }
            BodySpec::Text {
                text,
                heading_level,
            } => ContentBody::Text(match heading_level {
                Some(level) => Text::heading(text, level),
                None => Text::new(text),
            }),
            BodySpec::Raw { format, data } => ContentBody::Raw { format, data },
            BodySpec::Section { title, children } => ContentBody::Section {
                title,
                children: build_all(children, position)?,
            },
            BodySpec::Chart {
                title,
                kind,
                labels,
                series,
            } => ContentBody::Chart(Chart {
                title,
                kind,
                labels,
                series,
            }),
            BodySpec::Graph {
                title,
                directed,
                edges,
            } => ContentBody::Graph(Graph {
                title,
                directed,
                edges,
            }),
            BodySpec::Diagram {
                title,
                syntax,
                source,
            } => ContentBody::Diagram(Diagram {
                title,
                syntax,
                source,
            }),
            BodySpec::Collapsible {
                summary,
                expanded,
                children,
            } => ContentBody::Collapsible {
                summary,
                expanded,
                children: build_all(children, position)?,
            },
        };
        Ok(Content::new(id, body))
    }
}

impl RowSpec {
    fn into_record(self, table: &str, index: usize, schema: &[String]) -> Result<Record> {
        match self {
            RowSpec::Object(record) => Ok(record),
            RowSpec::Array(values) => {
                if values.len() != schema.len() {
                    return Err(Error::InvalidDocument(format!(
                        "table '{}': row {} has {} values, schema has {} columns",
                        table,
                        index,
                        values.len(),
                        schema.len()
                    )));
                }
                Ok(schema.iter().cloned().zip(values).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_table_rows() {
        let doc = load_str(
            r#"{"contents": [{"type": "table", "id": "t", "schema": ["a", "b"],
                "rows": [{"a": 1, "b": "x"}, [2, "y"]]}]}"#,
        )
        .unwrap();
        let table = doc.contents()[0].as_table().unwrap();
        assert_eq!(table.schema(), ["a", "b"]);
        assert_eq!(table.get(1, "a"), Some(&json!(2)));
        assert_eq!(table.get(1, "b"), Some(&json!("y")));
    }

    #[test]
    fn test_generated_ids() {
        let doc = load_str(
            r#"{"contents": [
                {"type": "text", "text": "intro"},
                {"type": "section", "title": "S", "children": [{"type": "text", "text": "x"}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(doc.contents()[0].id(), "1");
        assert_eq!(doc.contents()[1].children()[0].id(), "2.1");
    }

    #[test]
    fn test_row_length_mismatch() {
        let err = load_str(
            r#"{"contents": [{"type": "table", "id": "t", "schema": ["a", "b"], "rows": [[1]]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
        assert!(err.to_string().contains("row 0 has 1 values"));
    }

    #[test]
    fn test_unknown_type_is_json_error() {
        let err = load_str(r#"{"contents": [{"type": "video", "url": "x"}]}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_metadata_and_title() {
        let doc = load_str(
            r#"{"title": "T", "created": "2024-01-02T03:04:05Z", "metadata": {"k": "v"}}"#,
        )
        .unwrap();
        assert_eq!(doc.title(), Some("T"));
        assert_eq!(doc.get_metadata("k"), Some("v"));
        assert!(doc.created().is_some());
        assert!(doc.is_empty());
    }
}
