//! Markdown rendering.

use std::io;

use super::{prepare, RenderOptions, Renderer, TableFallback};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::model::{Chart, Content, ContentBody, Diagram, Document, Graph, Table, Text};

/// Convert a document to Markdown.
pub fn to_markdown(doc: &Document, options: &RenderOptions) -> Result<String> {
    let bytes = MarkdownRenderer::new(options.clone()).render(&Context::background(), doc)?;
    String::from_utf8(bytes).map_err(|e| Error::Render(format!("Markdown output is not UTF-8: {}", e)))
}

/// Renderer for the `markdown` format.
///
/// Streams one top-level content item at a time into the sink.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render options in use.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    fn render_content(
        &self,
        cx: &Context,
        output: &mut String,
        content: &Content,
        depth: usize,
    ) -> Result<()> {
        let content = prepare(cx, content)?;

        match content.body() {
            ContentBody::Text(text) => self.render_text(output, text),
            ContentBody::Table(table) => self.render_table(output, table),
            ContentBody::Raw { format, data } => render_raw(output, format, data),
            ContentBody::Section { title, children } => {
                self.render_heading(output, title, depth);
                for child in children {
                    self.render_content(cx, output, child, depth + 1)?;
                }
            }
            ContentBody::Chart(chart) => self.render_chart(output, chart),
            ContentBody::Graph(graph) => render_graph(output, graph),
            ContentBody::Diagram(diagram) => render_diagram(output, diagram),
            ContentBody::Collapsible {
                summary,
                expanded,
                children,
            } => {
                output.push_str(if *expanded { "<details open>\n" } else { "<details>\n" });
                output.push_str(&format!("<summary>{}</summary>\n\n", escape_html(summary)));
                for child in children {
                    self.render_content(cx, output, child, depth + 1)?;
                }
                output.push_str("</details>\n\n");
            }
        }
        Ok(())
    }

    fn render_heading(&self, output: &mut String, title: &str, depth: usize) {
        let level = self.options.heading_level(depth);
        output.push_str(&"#".repeat(level));
        output.push(' ');
        output.push_str(&escape_markdown(title));
        output.push_str("\n\n");
    }

    fn render_text(&self, output: &mut String, text: &Text) {
        match text.heading_level {
            Some(level) => {
                let level = level.clamp(1, self.options.max_heading_level.clamp(1, 6));
                output.push_str(&"#".repeat(level as usize));
                output.push(' ');
                output.push_str(&escape_markdown(text.text.trim()));
                output.push_str("\n\n");
            }
            None => {
                let body = text.text.trim();
                if !body.is_empty() {
                    output.push_str(&escape_markdown(body));
                    output.push_str("\n\n");
                }
            }
        }
    }

    fn render_table(&self, output: &mut String, table: &Table) {
        if table.column_count() == 0 {
            return;
        }

        if let Some(caption) = table.caption() {
            output.push_str(&format!("**{}**\n\n", escape_markdown(caption)));
        }

        let visible = self.options.visible_rows(table.row_count());
        match self.options.table_fallback {
            TableFallback::Markdown => render_table_markdown(output, table, visible),
            TableFallback::Html => render_table_html(output, table, visible),
        }

        let hidden = table.row_count() - visible;
        if hidden > 0 {
            output.push_str(&format!("_{} more rows_\n\n", hidden));
        }
    }

    fn render_chart(&self, output: &mut String, chart: &Chart) {
        if let Some(ref title) = chart.title {
            output.push_str(&format!("**{}**\n\n", escape_markdown(title)));
        }

        let mut header = vec![String::new()];
        header.extend(chart.series.iter().map(|s| escape_markdown(&s.name)));
        push_row(output, &header);
        push_separator(output, header.len());

        for (i, label) in chart.labels.iter().enumerate() {
            let mut row = vec![escape_markdown(label)];
            row.extend(
                chart
                    .series
                    .iter()
                    .map(|s| s.values.get(i).map(|v| v.to_string()).unwrap_or_default()),
            );
            push_row(output, &row);
        }
        output.push('\n');
    }
}

impl Renderer for MarkdownRenderer {
    fn format(&self) -> &str {
        "markdown"
    }

    fn render_to(&self, cx: &Context, doc: &Document, sink: &mut dyn io::Write) -> Result<()> {
        let mut depth = 0;
        if self.options.include_frontmatter {
            sink.write_all(doc.to_yaml_frontmatter().as_bytes())?;
            sink.write_all(b"\n")?;
        } else if let Some(title) = doc.title() {
            sink.write_all(format!("# {}\n\n", escape_markdown(title)).as_bytes())?;
            depth = 1;
        }

        for content in doc.contents() {
            let mut output = String::new();
            self.render_content(cx, &mut output, content, depth)?;
            sink.write_all(output.as_bytes())?;
        }
        Ok(())
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}

fn render_table_markdown(output: &mut String, table: &Table, visible: usize) {
    let header: Vec<String> = table.schema().iter().map(|c| escape_markdown(c)).collect();
    push_row(output, &header);
    push_separator(output, header.len());

    for row in table.rows().iter().take(visible) {
        let cells: Vec<String> = table
            .formatted_row(row)
            .iter()
            .map(|cell| escape_markdown(&cell.replace('\n', " ")))
            .collect();
        push_row(output, &cells);
    }
    output.push('\n');
}

fn render_table_html(output: &mut String, table: &Table, visible: usize) {
    output.push_str("<table>\n<thead>\n<tr>");
    for column in table.schema() {
        output.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    output.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in table.rows().iter().take(visible) {
        output.push_str("<tr>");
        for cell in table.formatted_row(row) {
            output.push_str(&format!("<td>{}</td>", escape_html(&cell)));
        }
        output.push_str("</tr>\n");
    }
    output.push_str("</tbody>\n</table>\n\n");
}

fn push_row(output: &mut String, cells: &[String]) {
    output.push('|');
    for cell in cells {
        output.push_str(&format!(" {} |", cell.trim()));
    }
    output.push('\n');
}

fn push_separator(output: &mut String, columns: usize) {
    output.push('|');
    for _ in 0..columns {
        output.push_str(" --- |");
    }
    output.push('\n');
}

fn render_raw(output: &mut String, format: &str, data: &str) {
    match format {
        "markdown" | "md" | "html" => {
            output.push_str(data.trim_end());
            output.push_str("\n\n");
        }
        _ => push_fence(output, format, data),
    }
}

fn render_graph(output: &mut String, graph: &Graph) {
    if let Some(ref title) = graph.title {
        output.push_str(&format!("**{}**\n\n", escape_markdown(title)));
    }

    let nodes = graph.nodes();
    let id = |name: &str| nodes.iter().position(|n| *n == name).unwrap_or(0);
    let arrow = if graph.directed { "-->" } else { "---" };

    let mut source = String::from("flowchart LR\n");
    for (i, node) in nodes.iter().enumerate() {
        source.push_str(&format!("    n{}[\"{}\"]\n", i, node.replace('"', "'")));
    }
    for edge in &graph.edges {
        match edge.label {
            Some(ref label) => source.push_str(&format!(
                "    n{} {}|{}| n{}\n",
                id(edge.from.as_str()),
                arrow,
                label.replace('|', "/"),
                id(edge.to.as_str())
            )),
            None => source.push_str(&format!(
                "    n{} {} n{}\n",
                id(edge.from.as_str()),
                arrow,
                id(edge.to.as_str())
            )),
        }
    }
    push_fence(output, "mermaid", &source);
}

fn render_diagram(output: &mut String, diagram: &Diagram) {
    if let Some(ref title) = diagram.title {
        output.push_str(&format!("**{}**\n\n", escape_markdown(title)));
    }
    push_fence(output, &diagram.syntax, &diagram.source);
}

fn push_fence(output: &mut String, info: &str, body: &str) {
    output.push_str("```");
    output.push_str(info);
    output.push('\n');
    output.push_str(body.trim_end_matches('\n'));
    output.push_str("\n```\n\n");
}

/// Escape characters that could be misinterpreted as Markdown syntax.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{record, Edge};
    use crate::ops::{Filter, Sort};
    use serde_json::json;

    fn people() -> Table {
        let rows = vec![
            record([("name", json!("Ann")), ("age", json!(31))]),
            record([("name", json!("Bob")), ("age", json!(25))]),
        ];
        Table::from_rows(["name", "age"], rows).unwrap()
    }

    fn render(doc: &Document, options: RenderOptions) -> String {
        to_markdown(doc, &options).unwrap()
    }

    #[test]
    fn test_markdown_table() {
        let doc = Document::new(vec![Content::table("t", people())]);
        let md = render(&doc, RenderOptions::default());
        assert!(md.contains("| name | age |"));
        assert!(md.contains("| --- | --- |"));
        assert!(md.contains("| Ann | 31 |"));
    }

    #[test]
    fn test_pipeline_runs_before_rendering() {
        let content = Content::table("t", people())
            .with_operation(Filter::column_equals("name", json!("Bob")))
            .with_operation(Sort::ascending("age"));
        let md = render(&Document::new(vec![content]), RenderOptions::default());
        assert!(md.contains("| Bob | 25 |"));
        assert!(!md.contains("Ann"));
    }

    #[test]
    fn test_frontmatter_and_title() {
        let doc = Document::new(vec![Content::text("p", "Body")]).with_title("Report");

        let md = render(&doc, RenderOptions::new().with_frontmatter(true));
        assert!(md.starts_with("---\ntitle: \"Report\""));

        let md = render(&doc, RenderOptions::default());
        assert!(md.starts_with("# Report\n\nBody"));
    }

    #[test]
    fn test_sections_nest_headings() {
        let doc = Document::new(vec![Content::section(
            "s",
            "Outer",
            vec![Content::section("i", "Inner", vec![Content::text("p", "x")])],
        )]);
        let md = render(&doc, RenderOptions::default());
        assert!(md.contains("# Outer\n"));
        assert!(md.contains("## Inner\n"));

        let md = render(&doc, RenderOptions::new().with_max_heading(1));
        assert!(md.contains("# Inner\n"));
    }

    #[test]
    fn test_html_tables_and_row_cap() {
        let doc = Document::new(vec![Content::table("t", people())]);
        let md = render(
            &doc,
            RenderOptions::new()
                .with_table_fallback(TableFallback::Html)
                .with_max_table_rows(1),
        );
        assert!(md.contains("<th>name</th>"));
        assert!(md.contains("<td>Ann</td>"));
        assert!(!md.contains("Bob"));
        assert!(md.contains("_1 more rows_"));
    }

    #[test]
    fn test_formatter_is_used() {
        let table = people().with_formatter("age", |v| format!("{} yrs", v));
        let md = render(&Document::new(vec![Content::table("t", table)]), RenderOptions::default());
        assert!(md.contains("| Ann | 31 yrs |"));
    }

    #[test]
    fn test_graph_and_raw() {
        let graph = Graph {
            title: None,
            directed: true,
            edges: vec![Edge {
                from: "a".into(),
                to: "b".into(),
                label: Some("calls".into()),
            }],
        };
        let doc = Document::new(vec![
            Content::new("g", ContentBody::Graph(graph)),
            Content::raw("r", "markdown", "*kept*"),
            Content::raw("c", "sql", "select 1"),
        ]);
        let md = render(&doc, RenderOptions::default());
        assert!(md.contains("```mermaid\nflowchart LR\n"));
        assert!(md.contains("n0 -->|calls| n1"));
        assert!(md.contains("*kept*"));
        assert!(md.contains("```sql\nselect 1\n```"));
    }

    #[test]
    fn test_collapsible() {
        let doc = Document::new(vec![Content::collapsible(
            "c",
            "More",
            false,
            vec![Content::text("p", "hidden")],
        )]);
        let md = render(&doc, RenderOptions::default());
        assert!(md.contains("<details>\n<summary>More</summary>"));
        assert!(md.contains("hidden"));
        assert!(md.contains("</details>"));
    }

    #[test]
    fn test_partial_output_left_in_sink() {
        let failing = Content::table("bad", people()).with_operation(Sort::ascending("missing"));
        let doc = Document::new(vec![Content::text("p", "first"), failing]);

        let mut sink = Vec::new();
        let err = MarkdownRenderer::default()
            .render_to(&Context::background(), &doc, &mut sink)
            .unwrap_err();
        assert!(matches!(err, Error::Pipeline(_)));
        assert_eq!(sink, b"first\n\n");
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a|b*c"), "a\\|b\\*c");
        assert_eq!(escape_markdown("1. item"), "1. item");
    }
}
