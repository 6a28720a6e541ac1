//! Rendering options and configuration.

use super::JsonFormat;

/// Options shared by the reference renderers.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Include YAML frontmatter with title and metadata (Markdown)
    pub include_frontmatter: bool,

    /// JSON output style
    pub json_format: JsonFormat,

    /// How to render tables in Markdown
    pub table_fallback: TableFallback,

    /// Maximum heading level (1-6); deeper sections are capped to it
    pub max_heading_level: u8,

    /// Maximum number of table rows written by text formats (`None` = all)
    pub max_table_rows: Option<usize>,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable frontmatter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }

    /// Set the JSON output style.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Set the table fallback mode.
    pub fn with_table_fallback(mut self, fallback: TableFallback) -> Self {
        self.table_fallback = fallback;
        self
    }

    /// Set the maximum heading level.
    pub fn with_max_heading(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, 6);
        self
    }

    /// Cap the number of rows written per table.
    pub fn with_max_table_rows(mut self, rows: usize) -> Self {
        self.max_table_rows = Some(rows);
        self
    }

    /// Heading level for a given nesting depth (0 = top level).
    pub fn heading_level(&self, depth: usize) -> usize {
        (depth + 1).min(self.max_heading_level.clamp(1, 6) as usize)
    }

    /// Number of rows to write for a table with `total` rows.
    pub fn visible_rows(&self, total: usize) -> usize {
        self.max_table_rows.map_or(total, |max| max.min(total))
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_frontmatter: false,
            json_format: JsonFormat::Pretty,
            table_fallback: TableFallback::Markdown,
            max_heading_level: 6,
            max_table_rows: None,
        }
    }
}

/// How Markdown tables are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFallback {
    /// Use standard Markdown table syntax
    #[default]
    Markdown,
    /// Use HTML table tags
    Html,
}
