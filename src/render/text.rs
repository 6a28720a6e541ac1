//! Plain text rendering.

use std::io;

use super::{prepare, RenderOptions, Renderer};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::model::{Content, ContentBody, Document, Table};

/// Convert a document to plain text.
pub fn to_text(doc: &Document, options: &RenderOptions) -> Result<String> {
    let bytes = TextRenderer::new(options.clone()).render(&Context::background(), doc)?;
    let output = String::from_utf8(bytes)
        .map_err(|e| Error::Render(format!("text output is not UTF-8: {}", e)))?;
    Ok(output.trim().to_string())
}

/// Renderer for the `text` format. Tables are tab-separated, header first.
#[derive(Debug, Clone, Default)]
pub struct TextRenderer {
    options: RenderOptions,
}

impl TextRenderer {
    /// Create a new plain text renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    fn render_content(&self, cx: &Context, output: &mut String, content: &Content) -> Result<()> {
        let content = prepare(cx, content)?;

        match content.body() {
            ContentBody::Text(text) => push_block(output, text.text.trim()),
            ContentBody::Table(table) => self.render_table(output, table),
            ContentBody::Raw { format, data } => match format.as_str() {
                "text" | "txt" | "plain" => push_block(output, data.trim_end()),
                other => log::debug!("content '{}': skipping raw {} block", content.id(), other),
            },
            ContentBody::Section { title, children } => {
                push_block(output, title);
                for child in children {
                    self.render_content(cx, output, child)?;
                }
            }
            ContentBody::Chart(chart) => {
                let mut lines = Vec::new();
                if let Some(ref title) = chart.title {
                    lines.push(title.clone());
                }
                for (i, label) in chart.labels.iter().enumerate() {
                    let values: Vec<String> = chart
                        .series
                        .iter()
                        .filter_map(|s| s.values.get(i).map(|v| format!("{}={}", s.name, v)))
                        .collect();
                    lines.push(format!("{}: {}", label, values.join(", ")));
                }
                push_block(output, &lines.join("\n"));
            }
            ContentBody::Graph(graph) => {
                let mut lines = Vec::new();
                if let Some(ref title) = graph.title {
                    lines.push(title.clone());
                }
                let arrow = if graph.directed { "->" } else { "--" };
                for edge in &graph.edges {
                    match edge.label {
                        Some(ref label) => {
                            lines.push(format!("{} {} {} ({})", edge.from, arrow, edge.to, label))
                        }
                        None => lines.push(format!("{} {} {}", edge.from, arrow, edge.to)),
                    }
                }
                push_block(output, &lines.join("\n"));
            }
            ContentBody::Diagram(diagram) => {
                if let Some(ref title) = diagram.title {
                    push_block(output, title);
                }
                push_block(output, diagram.source.trim_end());
            }
            ContentBody::Collapsible {
                summary, children, ..
            } => {
                push_block(output, summary);
                for child in children {
                    self.render_content(cx, output, child)?;
                }
            }
        }
        Ok(())
    }

    fn render_table(&self, output: &mut String, table: &Table) {
        if table.column_count() == 0 {
            return;
        }
        let mut lines = Vec::new();
        if let Some(caption) = table.caption() {
            lines.push(caption.to_string());
        }
        lines.push(table.schema().join("\t"));

        let visible = self.options.visible_rows(table.row_count());
        for row in table.rows().iter().take(visible) {
            lines.push(table.formatted_row(row).join("\t"));
        }
        if visible < table.row_count() {
            lines.push(format!("... {} more rows", table.row_count() - visible));
        }
        push_block(output, &lines.join("\n"));
    }
}

impl Renderer for TextRenderer {
    fn format(&self) -> &str {
        "text"
    }

    fn render_to(&self, cx: &Context, doc: &Document, sink: &mut dyn io::Write) -> Result<()> {
        if let Some(title) = doc.title() {
            sink.write_all(format!("{}\n\n", title).as_bytes())?;
        }
        for content in doc.contents() {
            let mut output = String::new();
            self.render_content(cx, &mut output, content)?;
            sink.write_all(output.as_bytes())?;
        }
        Ok(())
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}

fn push_block(output: &mut String, block: &str) {
    if block.is_empty() {
        return;
    }
    output.push_str(block);
    output.push_str("\n\n");
}
