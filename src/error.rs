//! Error types for docrender.
//!
//! Errors are layered the same way rendering is:
//!
//! - [`OperationError`] is produced by a single operation's `validate` or `apply`.
//! - [`PipelineError`] wraps an operation failure with the content identifier,
//!   operation index, and operation name.
//! - [`OutputError`] is a per-format failure at the orchestrator boundary
//!   (renderer, transformer, writer, or cancellation).
//! - [`MultiError`] aggregates every [`OutputError`] produced by one render call.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for docrender operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The orchestrator or a component was configured incorrectly.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A content item's operation pipeline failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A single per-format failure.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Aggregate of all per-format failures from one render call.
    #[error(transparent)]
    Multi(#[from] MultiError),

    /// The context was cancelled or its deadline passed.
    #[error("Cancelled: {0}")]
    Cancelled(#[from] CancelCause),

    /// Error while encoding a document into an output format.
    #[error("Rendering error: {0}")]
    Render(String),

    /// The document description could not be turned into a document.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Check whether this error was caused by cancellation anywhere in its chain.
    pub fn is_cancellation(&self) -> bool {
        match self {
            Error::Cancelled(_) => true,
            Error::Pipeline(e) => e.is_cancelled(),
            Error::Output(e) => e.component() == Component::Cancellation,
            Error::Multi(m) => {
                !m.is_empty() && m.iter().all(|e| e.component() == Component::Cancellation)
            }
            _ => false,
        }
    }
}

/// Why a context stopped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    /// Explicit cancellation.
    #[error("context canceled")]
    Cancelled,

    /// The context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Failure of a single operation, either at validation or at apply time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    /// Filter has no predicate.
    #[error("filter predicate is not set")]
    MissingPredicate,

    /// Sort has no keys.
    #[error("sort requires at least one key")]
    NoSortKeys,

    /// A sort key names an empty column.
    #[error("sort key {0} names an empty column")]
    EmptySortColumn(usize),

    /// Limit is negative.
    #[error("limit must not be negative (got {0})")]
    NegativeLimit(i64),

    /// GroupBy has no grouping columns.
    #[error("group by requires at least one column")]
    NoGroupColumns,

    /// A column name is empty.
    #[error("column name must not be empty")]
    EmptyColumnName,

    /// An aggregate has an empty output name.
    #[error("aggregate {0} has an empty output name")]
    EmptyAggregateName(usize),

    /// A referenced column does not exist in the schema.
    #[error("column '{0}' not found in schema")]
    ColumnNotFound(String),

    /// A column would be added twice.
    #[error("column '{0}' already exists in schema")]
    DuplicateColumn(String),

    /// A user-supplied callback panicked.
    #[error("{callback} panicked: {message}")]
    CallbackPanicked {
        /// Which callback (e.g. "filter predicate")
        callback: String,
        /// Panic payload rendered as text
        message: String,
    },

    /// The operation observed cancellation while running.
    #[error("operation cancelled: {0}")]
    Cancelled(CancelCause),

    /// Other operation-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Failure of a content item's operation pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The context was done before operation `index` could start.
    #[error("content '{content_id}': cancelled before operation {index}: {cause}")]
    Cancelled {
        /// Identifier of the content being transformed
        content_id: String,
        /// Index of the operation that did not run
        index: usize,
        /// Underlying cancellation cause
        #[source]
        cause: CancelCause,
    },

    /// Operation `index` failed validation; it was never applied.
    #[error("content '{content_id}': operation {index} ({operation}) failed validation: {source}")]
    Validation {
        /// Identifier of the content being transformed
        content_id: String,
        /// Index of the failing operation
        index: usize,
        /// Name of the failing operation
        operation: String,
        /// Validation cause
        #[source]
        source: OperationError,
    },

    /// Operation `index` failed while applying.
    #[error("content '{content_id}': operation {index} ({operation}) failed: {source}")]
    Apply {
        /// Identifier of the content being transformed
        content_id: String,
        /// Index of the failing operation
        index: usize,
        /// Name of the failing operation
        operation: String,
        /// Apply-time cause
        #[source]
        source: OperationError,
    },
}

impl PipelineError {
    /// Identifier of the content whose pipeline failed.
    pub fn content_id(&self) -> &str {
        match self {
            PipelineError::Cancelled { content_id, .. }
            | PipelineError::Validation { content_id, .. }
            | PipelineError::Apply { content_id, .. } => content_id,
        }
    }

    /// Index of the operation that failed or did not run.
    pub fn index(&self) -> usize {
        match self {
            PipelineError::Cancelled { index, .. }
            | PipelineError::Validation { index, .. }
            | PipelineError::Apply { index, .. } => *index,
        }
    }

    /// Check whether the pipeline stopped because of cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            PipelineError::Cancelled { .. }
                | PipelineError::Apply {
                    source: OperationError::Cancelled(_),
                    ..
                }
        )
    }
}

/// Component of the orchestrator a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    /// Format renderer (including the content pipelines it runs)
    Renderer,
    /// Byte transformer
    Transformer,
    /// Output writer
    Writer,
    /// Context cancellation between steps
    Cancellation,
}

impl Component {
    /// Lowercase name of the component.
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Renderer => "renderer",
            Component::Transformer => "transformer",
            Component::Writer => "writer",
            Component::Cancellation => "cancellation",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-format failure at the orchestrator boundary.
#[derive(Error, Debug)]
pub enum OutputError {
    /// The renderer failed.
    #[error("renderer {renderer} failed for format '{format}' after {output_size} bytes: {source}")]
    Render {
        /// Format name
        format: String,
        /// Renderer type
        renderer: String,
        /// Bytes produced before the failure
        output_size: usize,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// A transformer failed.
    #[error("transformer '{transformer}' failed for format '{format}': {source}")]
    Transform {
        /// Format name
        format: String,
        /// Transformer name
        transformer: String,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// A writer failed.
    #[error("writer {writer} failed for format '{format}' writing {data_size} bytes: {source}")]
    Write {
        /// Format name
        format: String,
        /// Writer type
        writer: String,
        /// Size of the data being written
        data_size: usize,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// The context was done before a step of this format could start.
    #[error("format '{format}' cancelled before {stage}: {cause}")]
    Cancelled {
        /// Format name
        format: String,
        /// Step that did not start (e.g. "render", "write to FileWriter")
        stage: String,
        /// Underlying cancellation cause
        #[source]
        cause: CancelCause,
    },
}

impl OutputError {
    /// Format the failure belongs to.
    pub fn format(&self) -> &str {
        match self {
            OutputError::Render { format, .. }
            | OutputError::Transform { format, .. }
            | OutputError::Write { format, .. }
            | OutputError::Cancelled { format, .. } => format,
        }
    }

    /// Originating component.
    ///
    /// Renderer failures caused by cancellation inside the renderer are
    /// classified as [`Component::Cancellation`].
    pub fn component(&self) -> Component {
        match self {
            OutputError::Render { source, .. } if source.is_cancellation() => {
                Component::Cancellation
            }
            OutputError::Render { .. } => Component::Renderer,
            OutputError::Transform { .. } => Component::Transformer,
            OutputError::Write { .. } => Component::Writer,
            OutputError::Cancelled { .. } => Component::Cancellation,
        }
    }

    /// Identity of the failing component (renderer type, transformer name,
    /// writer type, or the skipped stage for cancellations).
    pub fn component_name(&self) -> &str {
        match self {
            OutputError::Render { renderer, .. } => renderer,
            OutputError::Transform { transformer, .. } => transformer,
            OutputError::Write { writer, .. } => writer,
            OutputError::Cancelled { stage, .. } => stage,
        }
    }

    /// Byte count attached to the failure, if any.
    pub fn byte_count(&self) -> Option<usize> {
        match self {
            OutputError::Render { output_size, .. } => Some(*output_size),
            OutputError::Write { data_size, .. } => Some(*data_size),
            _ => None,
        }
    }
}

/// All per-format failures from one render call.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<OutputError>,
}

impl MultiError {
    /// Create an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a failure.
    pub fn push(&mut self, error: OutputError) {
        self.errors.push(error);
    }

    /// Check if no failures were recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of failures.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// All failures, in the order they were collected.
    pub fn errors(&self) -> &[OutputError] {
        &self.errors
    }

    /// Iterate over failures.
    pub fn iter(&self) -> std::slice::Iter<'_, OutputError> {
        self.errors.iter()
    }

    /// Failures originating from one component.
    pub fn by_component(&self, component: Component) -> impl Iterator<Item = &OutputError> {
        self.errors
            .iter()
            .filter(move |e| e.component() == component)
    }

    /// Failures belonging to one format.
    pub fn by_format<'a>(&'a self, format: &'a str) -> impl Iterator<Item = &'a OutputError> {
        self.errors.iter().filter(move |e| e.format() == format)
    }

    /// Count of failures per component.
    pub fn components(&self) -> BTreeMap<Component, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.errors {
            *counts.entry(e.component()).or_insert(0) += 1;
        }
        counts
    }

    /// Consume the aggregate and return the individual failures.
    pub fn into_errors(self) -> Vec<OutputError> {
        self.errors
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} output error(s)", self.errors.len())?;
        for e in &self.errors {
            write!(f, "\n  [{}] {}", e.component(), e)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

impl From<Vec<OutputError>> for MultiError {
    fn from(errors: Vec<OutputError>) -> Self {
        Self { errors }
    }
}

impl IntoIterator for MultiError {
    type Item = OutputError;
    type IntoIter = std::vec::IntoIter<OutputError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a MultiError {
    type Item = &'a OutputError;
    type IntoIter = std::slice::Iter<'a, OutputError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config("no formats configured".into());
        assert_eq!(err.to_string(), "Configuration error: no formats configured");

        let err = OperationError::NegativeLimit(-3);
        assert_eq!(err.to_string(), "limit must not be negative (got -3)");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_pipeline_error_names_content_and_operation() {
        let err = PipelineError::Apply {
            content_id: "sales".into(),
            index: 2,
            operation: "sort".into(),
            source: OperationError::ColumnNotFound("region".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("sales"));
        assert!(msg.contains("operation 2"));
        assert!(msg.contains("sort"));
        assert!(msg.contains("region"));
        assert_eq!(err.content_id(), "sales");
        assert_eq!(err.index(), 2);
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_pipeline_cancel_wraps_cause() {
        use std::error::Error as _;

        let err = PipelineError::Cancelled {
            content_id: "t".into(),
            index: 0,
            cause: CancelCause::DeadlineExceeded,
        };
        assert!(err.is_cancelled());
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "context deadline exceeded");
    }

    #[test]
    fn test_render_error_cancellation_classification() {
        let err = OutputError::Render {
            format: "json".into(),
            renderer: "JsonRenderer".into(),
            output_size: 12,
            source: Box::new(Error::Pipeline(PipelineError::Cancelled {
                content_id: "t".into(),
                index: 1,
                cause: CancelCause::Cancelled,
            })),
        };
        assert_eq!(err.component(), Component::Cancellation);
        assert_eq!(err.byte_count(), Some(12));

        let err = OutputError::Render {
            format: "json".into(),
            renderer: "JsonRenderer".into(),
            output_size: 0,
            source: Box::new(Error::Render("boom".into())),
        };
        assert_eq!(err.component(), Component::Renderer);
    }

    #[test]
    fn test_multi_error_classifies() {
        let mut multi = MultiError::new();
        multi.push(OutputError::Write {
            format: "md".into(),
            writer: "FileWriter".into(),
            data_size: 10,
            source: Box::new(Error::Other("disk full".into())),
        });
        multi.push(OutputError::Cancelled {
            format: "json".into(),
            stage: "render".into(),
            cause: CancelCause::Cancelled,
        });

        assert_eq!(multi.len(), 2);
        assert_eq!(multi.by_component(Component::Writer).count(), 1);
        assert_eq!(multi.by_format("json").count(), 1);
        assert_eq!(multi.components().get(&Component::Cancellation), Some(&1));

        let msg = multi.to_string();
        assert!(msg.starts_with("2 output error(s)"));
        assert!(msg.contains("[writer]"));
        assert!(msg.contains("FileWriter"));
    }
}
