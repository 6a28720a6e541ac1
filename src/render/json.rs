//! JSON rendering.
//!
//! Tables are written as `{"columns": [...], "rows": [[...], ...]}` with row
//! values in schema order, so key order survives serialization.

use std::io;

use serde_json::{Map, Value};

use super::{prepare, RenderOptions, Renderer};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::model::{Content, ContentBody, Document, Table};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document to JSON.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let bytes = JsonRenderer::new(format).render(&Context::background(), doc)?;
    String::from_utf8(bytes).map_err(|e| Error::Render(format!("JSON output is not UTF-8: {}", e)))
}

/// Renderer for the `json` format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer {
    format: JsonFormat,
}

impl JsonRenderer {
    /// Create a JSON renderer.
    pub fn new(format: JsonFormat) -> Self {
        Self { format }
    }

    /// Create a JSON renderer from shared render options.
    pub fn from_options(options: &RenderOptions) -> Self {
        Self::new(options.json_format)
    }

    /// Build the JSON value for a document, running every content pipeline.
    pub fn to_value(&self, cx: &Context, doc: &Document) -> Result<Value> {
        let mut map = Map::new();
        if let Some(title) = doc.title() {
            map.insert("title".into(), Value::from(title));
        }
        if let Some(created) = doc.created() {
            map.insert("created".into(), Value::from(created.to_rfc3339()));
        }
        if !doc.metadata().is_empty() {
            let metadata = doc
                .metadata()
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect();
            map.insert("metadata".into(), Value::Object(metadata));
        }
        map.insert("contents".into(), contents_value(cx, doc.contents())?);
        Ok(Value::Object(map))
    }
}

impl Renderer for JsonRenderer {
    fn format(&self) -> &str {
        "json"
    }

    fn render_to(&self, cx: &Context, doc: &Document, sink: &mut dyn io::Write) -> Result<()> {
        let value = self.to_value(cx, doc)?;
        match self.format {
            JsonFormat::Pretty => serde_json::to_writer_pretty(&mut *sink, &value)?,
            JsonFormat::Compact => serde_json::to_writer(&mut *sink, &value)?,
        }
        sink.write_all(b"\n")?;
        Ok(())
    }
}

fn contents_value(cx: &Context, contents: &[Content]) -> Result<Value> {
    contents
        .iter()
        .map(|c| content_value(cx, c))
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

fn content_value(cx: &Context, content: &Content) -> Result<Value> {
    let content = prepare(cx, content)?;

    let mut map = Map::new();
    map.insert("id".into(), Value::from(content.id()));
    map.insert("type".into(), Value::from(content.kind()));

    match content.body() {
        ContentBody::Table(table) => table_fields(&mut map, table),
        ContentBody::Text(text) => {
            map.insert("text".into(), Value::from(text.text.as_str()));
            if let Some(level) = text.heading_level {
                map.insert("heading_level".into(), Value::from(level));
            }
        }
        ContentBody::Raw { format, data } => {
            map.insert("format".into(), Value::from(format.as_str()));
            map.insert("data".into(), Value::from(data.as_str()));
        }
        ContentBody::Section { title, children } => {
            map.insert("title".into(), Value::from(title.as_str()));
            map.insert("children".into(), contents_value(cx, children)?);
        }
        ContentBody::Chart(chart) => merge(&mut map, serde_json::to_value(chart)?),
        ContentBody::Graph(graph) => merge(&mut map, serde_json::to_value(graph)?),
        ContentBody::Diagram(diagram) => merge(&mut map, serde_json::to_value(diagram)?),
        ContentBody::Collapsible {
            summary,
            expanded,
            children,
        } => {
            map.insert("summary".into(), Value::from(summary.as_str()));
            map.insert("expanded".into(), Value::Bool(*expanded));
            map.insert("children".into(), contents_value(cx, children)?);
        }
    }

    Ok(Value::Object(map))
}

fn table_fields(map: &mut Map<String, Value>, table: &Table) {
    let columns = table.schema().iter().map(|c| Value::from(c.as_str())).collect();
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            Value::Array(
                table
                    .schema()
                    .iter()
                    .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                    .collect(),
            )
        })
        .collect();

    map.insert("columns".into(), Value::Array(columns));
    map.insert("rows".into(), Value::Array(rows));
    if let Some(caption) = table.caption() {
        map.insert("caption".into(), Value::from(caption));
    }
}

fn merge(map: &mut Map<String, Value>, value: Value) {
    if let Value::Object(fields) = value {
        map.extend(fields);
    }
}
