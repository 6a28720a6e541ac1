//! docrender CLI - Render structured documents to Markdown, text, and JSON

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use docrender::model::{Content, ContentBody, Document};
use docrender::ops::{Aggregate, Filter, GroupBy, Limit, Operation, Sort, SortKey};
use docrender::render::{JsonRenderer, MarkdownRenderer, TextRenderer};
use docrender::transform::{CleanupTransformer, GzipTransformer};
use docrender::write::{FileWriter, StdoutWriter};
use docrender::{
    Context, Error as RenderError, JsonFormat, Output, Progress, RenderOptions, TableFallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "docrender")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Render structured documents to Markdown, text, and JSON", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a JSON document description to one or more formats
    Render {
        /// Input document (JSON)
        input: PathBuf,

        /// Output directory (default: <input>_output)
        #[arg(short, long, env = "DOCRENDER_OUTPUT")]
        output: Option<PathBuf>,

        /// Formats to produce (default: all)
        #[arg(short, long, value_enum)]
        format: Vec<OutputFormat>,

        /// Print results to stdout instead of writing files
        #[arg(long)]
        stdout: bool,

        /// Keep only rows where COLUMN equals VALUE (column=value)
        #[arg(long, value_name = "COLUMN=VALUE")]
        filter: Vec<String>,

        /// Sort tables by column (column, column:desc, -column)
        #[arg(long, value_name = "KEY", allow_hyphen_values = true)]
        sort: Vec<SortKey>,

        /// Keep at most N rows per table
        #[arg(long)]
        limit: Option<i64>,

        /// Group table rows by column
        #[arg(long, value_name = "COLUMN")]
        group_by: Vec<String>,

        /// Add a row count column when grouping
        #[arg(long, requires = "group_by")]
        count: bool,

        /// Text cleanup level for Markdown and text output
        #[arg(long, value_enum)]
        cleanup: Option<CleanupLevel>,

        /// Gzip every output
        #[arg(long)]
        gzip: bool,

        /// Include YAML frontmatter in Markdown output
        #[arg(long)]
        frontmatter: bool,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,

        /// Table rendering mode for Markdown output
        #[arg(long, value_enum, default_value = "markdown")]
        table_mode: TableMode,

        /// Deepest heading level to emit (1-6)
        #[arg(long, default_value = "6")]
        max_heading: u8,

        /// Render at most N rows per table
        #[arg(long)]
        max_rows: Option<usize>,

        /// Abort rendering after this many seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },

    /// Show document information
    Info {
        /// Input document (JSON)
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Normalized JSON
    Json,
    /// Markdown
    Markdown,
    /// Plain text
    Text,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CleanupLevel {
    /// Minimal cleanup (Unicode normalization only)
    Minimal,
    /// Standard cleanup (recommended)
    Standard,
    /// Aggressive cleanup
    Aggressive,
}

impl From<CleanupLevel> for docrender::CleanupPreset {
    fn from(level: CleanupLevel) -> Self {
        match level {
            CleanupLevel::Minimal => docrender::CleanupPreset::Minimal,
            CleanupLevel::Standard => docrender::CleanupPreset::Standard,
            CleanupLevel::Aggressive => docrender::CleanupPreset::Aggressive,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TableMode {
    /// Pipe tables
    Markdown,
    /// HTML tables
    Html,
}

impl From<TableMode> for TableFallback {
    fn from(mode: TableMode) -> Self {
        match mode {
            TableMode::Markdown => TableFallback::Markdown,
            TableMode::Html => TableFallback::Html,
        }
    }
}

/// Table operations requested on the command line, applied to every table.
#[derive(Default)]
struct TableOps {
    filters: Vec<(String, serde_json::Value)>,
    sort: Vec<SortKey>,
    group_by: Vec<String>,
    count: bool,
    limit: Option<i64>,
}

impl TableOps {
    fn is_empty(&self) -> bool {
        self.filters.is_empty()
            && self.sort.is_empty()
            && self.group_by.is_empty()
            && self.limit.is_none()
    }

    fn operations(&self) -> Vec<Arc<dyn Operation>> {
        let mut ops: Vec<Arc<dyn Operation>> = Vec::new();
        for (column, value) in &self.filters {
            ops.push(Arc::new(Filter::column_equals(column.clone(), value.clone())));
        }
        if !self.group_by.is_empty() {
            let aggregates = if self.count {
                vec![Aggregate::count()]
            } else {
                Vec::new()
            };
            ops.push(Arc::new(GroupBy::new(self.group_by.clone(), aggregates)));
        }
        if !self.sort.is_empty() {
            ops.push(Arc::new(Sort::new(self.sort.clone())));
        }
        if let Some(n) = self.limit {
            ops.push(Arc::new(Limit::new(n)));
        }
        ops
    }
}

/// Parse `column=value`. The value is read as JSON when possible so that
/// `qty=3` matches the number 3; anything else is a string.
fn parse_filter(arg: &str) -> Result<(String, serde_json::Value), String> {
    let (column, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("invalid filter '{}': expected column=value", arg))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("invalid filter '{}': empty column", arg));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((column.to_string(), value))
}

/// Attach `ops` to every table in `items`, descending into sections and
/// collapsible blocks.
fn attach_ops(items: &[Content], ops: &[Arc<dyn Operation>]) -> Vec<Content> {
    items
        .iter()
        .map(|item| match item.body() {
            ContentBody::Table(_) => item.clone().with_operations(ops.iter().cloned()),
            ContentBody::Section { title, children } => item.with_body(ContentBody::Section {
                title: title.clone(),
                children: attach_ops(children, ops),
            }),
            ContentBody::Collapsible {
                summary,
                expanded,
                children,
            } => item.with_body(ContentBody::Collapsible {
                summary: summary.clone(),
                expanded: *expanded,
                children: attach_ops(children, ops),
            }),
            _ => item.clone(),
        })
        .collect()
}

fn with_table_ops(doc: Document, table_ops: &TableOps) -> Document {
    if table_ops.is_empty() {
        return doc;
    }
    let ops = table_ops.operations();
    let mut out = Document::new(attach_ops(doc.contents(), &ops));
    if let Some(title) = doc.title() {
        out = out.with_title(title);
    }
    if let Some(created) = doc.created() {
        out = out.with_created(created);
    }
    for (key, value) in doc.metadata() {
        out = out.with_metadata(key.clone(), value.clone());
    }
    out
}

/// Terminal progress bar for renders.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Ok(Self { bar })
    }
}

impl Progress for BarProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
    }

    fn set_current(&self, current: u64) {
        self.bar.set_position(current);
    }

    fn increment(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    fn complete(&self) {
        self.bar.set_message("Done");
    }

    fn fail(&self, _error: &RenderError) {
        self.bar.set_message("Failed");
    }

    fn close(&self) {
        self.bar.finish_and_clear();
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            input,
            output,
            format,
            stdout,
            filter,
            sort,
            limit,
            group_by,
            count,
            cleanup,
            gzip,
            frontmatter,
            compact,
            table_mode,
            max_heading,
            max_rows,
            timeout,
        } => {
            let filters = filter
                .iter()
                .map(|f| parse_filter(f))
                .collect::<Result<Vec<_>, _>>();
            match filters {
                Ok(filters) => {
                    let table_ops = TableOps {
                        filters,
                        sort,
                        group_by,
                        count,
                        limit,
                    };
                    let mut options = RenderOptions::new()
                        .with_frontmatter(frontmatter)
                        .with_table_fallback(table_mode.into())
                        .with_max_heading(max_heading);
                    if compact {
                        options = options.with_json_format(JsonFormat::Compact);
                    }
                    if let Some(rows) = max_rows {
                        options = options.with_max_table_rows(rows);
                    }
                    cmd_render(
                        &input,
                        output.as_deref(),
                        &format,
                        stdout,
                        &table_ops,
                        &options,
                        cleanup,
                        gzip,
                        timeout,
                    )
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => cmd_version(),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_render(
    input: &Path,
    output: Option<&Path>,
    formats: &[OutputFormat],
    to_stdout: bool,
    table_ops: &TableOps,
    options: &RenderOptions,
    cleanup: Option<CleanupLevel>,
    gzip: bool,
    timeout: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let formats = if formats.is_empty() {
        vec![OutputFormat::Markdown, OutputFormat::Text, OutputFormat::Json]
    } else {
        let mut unique = Vec::new();
        for f in formats {
            if !unique.contains(f) {
                unique.push(*f);
            }
        }
        unique
    };

    let doc = docrender::load_file(input)?;
    let doc = with_table_ops(doc, table_ops);
    log::info!(
        "loaded '{}' ({} items)",
        input.display(),
        doc.total_items()
    );

    let mut out = Output::new();
    for format in &formats {
        out = match format {
            OutputFormat::Json => out.with_renderer(JsonRenderer::from_options(options)),
            OutputFormat::Markdown => out.with_renderer(MarkdownRenderer::new(options.clone())),
            OutputFormat::Text => out.with_renderer(TextRenderer::new(options.clone())),
        };
    }

    if let Some(level) = cleanup {
        out = out.with_transformer(CleanupTransformer::from_preset(level.into())?);
    }
    if gzip {
        out = out.with_transformer(GzipTransformer::new());
    }

    let file_writer = if to_stdout {
        out = out.with_writer(StdoutWriter::new().with_headers(formats.len() > 1));
        None
    } else {
        let output_dir = output.map(PathBuf::from).unwrap_or_else(|| {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            input.with_file_name(format!("{}_output", stem))
        });
        let mut writer = FileWriter::new(output_dir);
        if gzip {
            writer = writer
                .with_extension("json", "json.gz")
                .with_extension("markdown", "md.gz")
                .with_extension("text", "txt.gz");
        }
        let writer = Arc::new(writer);
        out = out.with_writer_arc(writer.clone());
        Some(writer)
    };

    let progress = if to_stdout {
        None
    } else {
        Some(Arc::new(BarProgress::new()?))
    };
    if let Some(ref progress) = progress {
        out = out.with_progress(progress.clone());
    }

    let cx = match timeout {
        Some(secs) => Context::background().with_timeout(Duration::from_secs(secs)),
        None => Context::background(),
    };

    let result = out.render(&cx, &doc);
    if let Some(ref progress) = progress {
        progress.close();
    }

    if let Err(RenderError::Multi(ref errors)) = result {
        eprintln!(
            "{} {} of {} outputs failed",
            "✗".red().bold(),
            errors.len(),
            formats.len() * out.writer_count()
        );
    }
    result?;

    if let Some(writer) = file_writer {
        println!(
            "{} Rendered to {}",
            "✓".green().bold(),
            writer.dir().display()
        );
        for format in &out.format_names() {
            println!("  {} {}", "├─".dimmed(), writer.path_for(format).display());
        }
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let doc = docrender::load_file(input)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    if let Some(title) = doc.title() {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(created) = doc.created() {
        println!("{}: {}", "Created".bold(), created.to_rfc3339());
    }
    for (key, value) in doc.metadata() {
        println!("{}: {}", key.bold(), value);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let mut kinds = BTreeMap::new();
    let mut rows = 0usize;
    count_kinds(doc.contents(), &mut kinds, &mut rows);

    println!("{}: {}", "Top-level items".bold(), doc.len());
    println!("{}: {}", "Total items".bold(), doc.total_items());
    for (kind, n) in &kinds {
        println!("  {} {}: {}", "├─".dimmed(), kind, n);
    }
    println!("{}: {}", "Table rows".bold(), rows);

    Ok(())
}

fn count_kinds(items: &[Content], kinds: &mut BTreeMap<&'static str, usize>, rows: &mut usize) {
    for item in items {
        *kinds.entry(item.kind()).or_insert(0) += 1;
        if let Some(table) = item.as_table() {
            *rows += table.row_count();
        }
        count_kinds(item.children(), kinds, rows);
    }
}

fn cmd_version() -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{} {}",
        "docrender".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("Render structured documents to Markdown, text, and JSON");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/docrender".dimmed());
    println!("License: MIT");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrender::model::{record, Table};
    use serde_json::json;

    #[test]
    fn test_parse_filter_json_value() {
        let (column, value) = parse_filter("qty=3").unwrap();
        assert_eq!(column, "qty");
        assert_eq!(value, json!(3));
    }

    #[test]
    fn test_parse_filter_string_fallback() {
        let (_, value) = parse_filter("city=Oslo").unwrap();
        assert_eq!(value, json!("Oslo"));
    }

    #[test]
    fn test_parse_filter_invalid() {
        assert!(parse_filter("no-equals").is_err());
        assert!(parse_filter("=1").is_err());
    }

    #[test]
    fn test_attach_ops_reaches_nested_tables() {
        let table = Table::from_rows(["a"], vec![record([("a", json!(1))])]).unwrap();
        let doc = Document::new(vec![
            Content::text("intro", "hi"),
            Content::section("s", "S", vec![Content::table("t", table)]),
        ])
        .with_title("T");
        let ops = TableOps {
            limit: Some(0),
            ..Default::default()
        };
        let doc = with_table_ops(doc, &ops);
        assert_eq!(doc.title(), Some("T"));
        assert!(!doc.contents()[0].has_operations());
        assert_eq!(doc.find("t").unwrap().operations().len(), 1);
    }

    #[test]
    fn test_operation_order() {
        let ops = TableOps {
            filters: vec![("a".into(), json!(1))],
            sort: vec![SortKey::desc("a")],
            group_by: vec!["a".into()],
            count: true,
            limit: Some(5),
        };
        let names: Vec<_> = ops.operations().iter().map(|o| o.name().to_string()).collect();
        assert_eq!(names, ["filter", "group_by", "sort", "limit"]);
    }
}
