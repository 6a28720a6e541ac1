//! # docrender
//!
//! Render structured documents to many output formats at once.
//!
//! A [`Document`] is an ordered list of [`Content`] items (tables, text,
//! sections, charts, graphs, diagrams, raw blocks). Each item can carry a
//! chain of [`Operation`]s (filter, sort, limit, group-by, derived columns)
//! that run lazily every time the item is rendered. An [`Output`] renders a
//! document to every configured format concurrently, post-processes the
//! bytes with transformers, and writes them to every configured writer,
//! collecting per-format failures instead of stopping at the first one.
//!
//! ## Quick Start
//!
//! ```
//! use docrender::ops::{Limit, Sort};
//! use docrender::render::{JsonRenderer, MarkdownRenderer};
//! use docrender::write::MemoryWriter;
//! use docrender::{record, Content, Context, Document, Output, Table};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! fn main() -> docrender::Result<()> {
//!     let rows = vec![
//!         record([("city", json!("Oslo")), ("pop", json!(709))]),
//!         record([("city", json!("Bergen")), ("pop", json!(291))]),
//!         record([("city", json!("Tromsø")), ("pop", json!(77))]),
//!     ];
//!     let table = Table::from_rows(["city", "pop"], rows)?;
//!     let doc = Document::new(vec![Content::table("cities", table)
//!         .with_operation(Sort::descending("pop"))
//!         .with_operation(Limit::new(2))])
//!     .with_title("Largest cities");
//!
//!     let memory = Arc::new(MemoryWriter::new());
//!     let output = Output::new()
//!         .with_renderer(MarkdownRenderer::default())
//!         .with_renderer(JsonRenderer::default())
//!         .with_writer_arc(memory.clone());
//!
//!     output.render(&Context::background(), &doc)?;
//!     assert!(memory.get_string("markdown").unwrap().contains("| Oslo | 709 |"));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Lazy per-content pipelines**: operations are validated and applied at
//!   render time; the document itself is never modified
//! - **Concurrent fan-out**: one thread per format, sequential writers
//! - **Partial failure reporting**: every failure is kept in a [`MultiError`]
//! - **Cooperative cancellation**: [`Context`] with cancel and deadline
//! - **Reference components**: JSON, Markdown and text renderers; file,
//!   stdout and memory writers; cleanup and gzip transformers

pub mod context;
pub mod error;
pub mod guard;
pub mod load;
pub mod model;
pub mod ops;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod transform;
pub mod write;

// Re-export commonly used types
pub use context::Context;
pub use error::{
    CancelCause, Component, Error, MultiError, OperationError, OutputError, PipelineError, Result,
};
pub use load::{load_file, load_reader, load_str};
pub use model::{
    record, Chart, ChartKind, Content, ContentBody, Diagram, Document, Edge, Graph, Record,
    Series, Table, Text, Value,
};
pub use ops::Operation;
pub use output::{Format, Output};
pub use pipeline::{apply_transformations, optimization_hints, validate_operations};
pub use progress::{LogProgress, NoProgress, Progress};
pub use render::{JsonFormat, RenderOptions, Renderer, TableFallback};
pub use transform::{CleanupOptions, CleanupPreset, Transformer};
pub use write::Writer;

use std::path::Path;

/// Load a JSON document description and convert it to Markdown.
///
/// # Example
///
/// ```no_run
/// use docrender::to_markdown;
///
/// let markdown = to_markdown("report.json").unwrap();
/// std::fs::write("report.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = load_file(path)?;
    render::to_markdown(&doc, &RenderOptions::default())
}

/// Load a JSON document description and convert it to Markdown with custom options.
///
/// # Example
///
/// ```no_run
/// use docrender::{to_markdown_with_options, RenderOptions, TableFallback};
///
/// let options = RenderOptions::new()
///     .with_frontmatter(true)
///     .with_table_fallback(TableFallback::Html);
/// let markdown = to_markdown_with_options("report.json", &options).unwrap();
/// ```
pub fn to_markdown_with_options<P: AsRef<Path>>(
    path: P,
    options: &RenderOptions,
) -> Result<String> {
    let doc = load_file(path)?;
    render::to_markdown(&doc, options)
}

/// Load a JSON document description and convert it to plain text.
pub fn to_text<P: AsRef<Path>>(path: P, options: &RenderOptions) -> Result<String> {
    let doc = load_file(path)?;
    render::to_text(&doc, options)
}

/// Load a JSON document description and convert it to normalized JSON.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = load_file(path)?;
    render::to_json(&doc, format)
}
