//! Content items and their typed bodies.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Table;
use crate::ops::Operation;

/// One addressable unit of a document.
///
/// A content item has a stable identifier, a typed body, and an ordered list
/// of operations fixed at construction. Running the operations never edits
/// the item; it produces a new one (see [`crate::pipeline`]).
#[derive(Clone)]
pub struct Content {
    id: String,
    body: ContentBody,
    operations: Arc<[Arc<dyn Operation>]>,
}

impl Content {
    /// Create a content item without operations.
    pub fn new(id: impl Into<String>, body: ContentBody) -> Self {
        Self {
            id: id.into(),
            body,
            operations: Arc::from(Vec::new()),
        }
    }

    /// Create table content.
    pub fn table(id: impl Into<String>, table: Table) -> Self {
        Self::new(id, ContentBody::Table(table))
    }

    /// Create text content.
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, ContentBody::Text(Text::new(text)))
    }

    /// Create a heading.
    pub fn heading(id: impl Into<String>, text: impl Into<String>, level: u8) -> Self {
        Self::new(id, ContentBody::Text(Text::heading(text, level)))
    }

    /// Create raw, pre-formatted content for one format.
    pub fn raw(id: impl Into<String>, format: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(
            id,
            ContentBody::Raw {
                format: format.into(),
                data: data.into(),
            },
        )
    }

    /// Create a section with nested content.
    pub fn section(id: impl Into<String>, title: impl Into<String>, children: Vec<Content>) -> Self {
        Self::new(
            id,
            ContentBody::Section {
                title: title.into(),
                children,
            },
        )
    }

    /// Create a collapsible section with nested content.
    pub fn collapsible(
        id: impl Into<String>,
        summary: impl Into<String>,
        expanded: bool,
        children: Vec<Content>,
    ) -> Self {
        Self::new(
            id,
            ContentBody::Collapsible {
                summary: summary.into(),
                expanded,
                children,
            },
        )
    }

    /// Attach an operation.
    pub fn with_operation(self, operation: impl Operation + 'static) -> Self {
        self.with_operation_arc(Arc::new(operation))
    }

    /// Attach a shared operation.
    pub fn with_operation_arc(self, operation: Arc<dyn Operation>) -> Self {
        let mut ops: Vec<Arc<dyn Operation>> = self.operations.iter().cloned().collect();
        ops.push(operation);
        Self {
            operations: Arc::from(ops),
            ..self
        }
    }

    /// Attach several operations in order.
    pub fn with_operations(self, operations: impl IntoIterator<Item = Arc<dyn Operation>>) -> Self {
        let mut ops: Vec<Arc<dyn Operation>> = self.operations.iter().cloned().collect();
        ops.extend(operations);
        Self {
            operations: Arc::from(ops),
            ..self
        }
    }

    /// A new item with the same identifier and operations and a different body.
    pub fn with_body(&self, body: ContentBody) -> Self {
        Self {
            id: self.id.clone(),
            body,
            operations: Arc::clone(&self.operations),
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Typed body.
    pub fn body(&self) -> &ContentBody {
        &self.body
    }

    /// Attached operations, in execution order.
    pub fn operations(&self) -> &[Arc<dyn Operation>] {
        &self.operations
    }

    /// Check if any operations are attached.
    pub fn has_operations(&self) -> bool {
        !self.operations.is_empty()
    }

    /// Table body, if this is table content.
    pub fn as_table(&self) -> Option<&Table> {
        match &self.body {
            ContentBody::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Short name of the body variant.
    pub fn kind(&self) -> &'static str {
        self.body.kind()
    }

    /// Nested content of sections; empty for other variants.
    pub fn children(&self) -> &[Content] {
        match &self.body {
            ContentBody::Section { children, .. } | ContentBody::Collapsible { children, .. } => {
                children
            }
            _ => &[],
        }
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Content")
            .field("id", &self.id)
            .field("body", &self.body)
            .field(
                "operations",
                &self.operations.iter().map(|o| o.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl PartialEq for Content {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.body == other.body
            && self.operations.len() == other.operations.len()
            && self
                .operations
                .iter()
                .zip(other.operations.iter())
                .all(|(a, b)| a.name() == b.name())
    }
}

/// Typed body of a content item.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBody {
    /// Table with schema and rows
    Table(Table),

    /// Paragraph or heading text
    Text(Text),

    /// Pre-formatted content. Renderers of the matching format pass it
    /// through; Markdown shows other formats as fenced code and plain text
    /// output skips them.
    Raw {
        /// Format the data is written in (e.g. "markdown", "html")
        format: String,
        /// Raw data
        data: String,
    },

    /// Titled group of nested content
    Section {
        /// Section title
        title: String,
        /// Nested content
        children: Vec<Content>,
    },

    /// Chart data
    Chart(Chart),

    /// Node/edge graph
    Graph(Graph),

    /// Diagram in a text syntax (e.g. mermaid)
    Diagram(Diagram),

    /// Section that viewers may show collapsed
    Collapsible {
        /// Summary line shown when collapsed
        summary: String,
        /// Whether the section starts expanded
        expanded: bool,
        /// Nested content
        children: Vec<Content>,
    },
}

impl ContentBody {
    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentBody::Table(_) => "table",
            ContentBody::Text(_) => "text",
            ContentBody::Raw { .. } => "raw",
            ContentBody::Section { .. } => "section",
            ContentBody::Chart(_) => "chart",
            ContentBody::Graph(_) => "graph",
            ContentBody::Diagram(_) => "diagram",
            ContentBody::Collapsible { .. } => "collapsible",
        }
    }
}

/// Paragraph or heading text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    /// Text content
    pub text: String,

    /// Heading level (1-6), `None` for body text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<u8>,
}

impl Text {
    /// Create body text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            heading_level: None,
        }
    }

    /// Create a heading.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self {
            text: text.into(),
            heading_level: Some(level.clamp(1, 6)),
        }
    }
}

/// Chart type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Bar chart
    #[default]
    Bar,
    /// Line chart
    Line,
    /// Pie chart
    Pie,
    /// Scatter plot
    Scatter,
}

/// Chart data: category labels and one or more value series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    /// Chart title
    #[serde(default)]
    pub title: Option<String>,

    /// Chart type
    #[serde(default)]
    pub kind: ChartKind,

    /// Category labels
    #[serde(default)]
    pub labels: Vec<String>,

    /// Value series
    #[serde(default)]
    pub series: Vec<Series>,
}

/// One named series of chart values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Series name
    pub name: String,

    /// Values, aligned with the chart labels
    pub values: Vec<f64>,
}

/// A graph of labelled edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    /// Graph title
    #[serde(default)]
    pub title: Option<String>,

    /// Whether edges are directed
    #[serde(default = "default_directed")]
    pub directed: bool,

    /// Edges
    #[serde(default)]
    pub edges: Vec<Edge>,
}

fn default_directed() -> bool {
    true
}

impl Graph {
    /// Distinct node names in first-seen order.
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = Vec::new();
        for edge in &self.edges {
            for n in [edge.from.as_str(), edge.to.as_str()] {
                if !nodes.contains(&n) {
                    nodes.push(n);
                }
            }
        }
        nodes
    }
}

/// A graph edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node
    pub from: String,

    /// Target node
    pub to: String,

    /// Optional edge label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A diagram described in a text syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagram {
    /// Diagram title
    #[serde(default)]
    pub title: Option<String>,

    /// Syntax of the source (e.g. "mermaid", "plantuml")
    pub syntax: String,

    /// Diagram source
    pub source: String,
}
