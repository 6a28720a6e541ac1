//! Multi-format render orchestrator.
//!
//! An [`Output`] holds a set of [`Format`]s (name + renderer), writers,
//! transformers, and a progress sink. [`Output::render`] renders one document
//! to every format concurrently, one thread per format:
//!
//! 1. the context is checked; a done context records a cancellation and the
//!    renderer is never called,
//! 2. the renderer produces bytes (running each content pipeline),
//! 3. applicable transformers run in ascending priority,
//! 4. the bytes are written to every writer in registration order, with a
//!    context check before each write.
//!
//! Failures of one format never stop the others. Every failure is collected
//! into a [`MultiError`]; the render fails if at least one was recorded.
//!
//! # Example
//!
//! ```
//! use docrender::{Content, Context, Document, Output, Table};
//! use docrender::render::MarkdownRenderer;
//! use docrender::write::MemoryWriter;
//! use std::sync::Arc;
//!
//! let table = Table::new(["name", "qty"]);
//! let doc = Document::new(vec![Content::table("stock", table)]);
//!
//! let memory = Arc::new(MemoryWriter::new());
//! let output = Output::new()
//!     .with_renderer(MarkdownRenderer::default())
//!     .with_writer_arc(memory.clone());
//!
//! output.render(&Context::background(), &doc).unwrap();
//! assert!(memory.get_string("markdown").unwrap().contains("| name | qty |"));
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;

use crossbeam_channel::Sender;

use crate::context::Context;
use crate::error::{Error, MultiError, OutputError, Result};
use crate::guard::component_guarded;
use crate::model::Document;
use crate::progress::{NoProgress, Progress};
use crate::render::Renderer;
use crate::transform::{applicable, Transformer};
use crate::write::Writer;

/// A named output format and the renderer that produces it.
#[derive(Clone)]
pub struct Format {
    name: String,
    renderer: Arc<dyn Renderer>,
}

impl Format {
    /// Create a format with an explicit name.
    pub fn new(name: impl Into<String>, renderer: impl Renderer + 'static) -> Self {
        Self::from_arc(name, Arc::new(renderer))
    }

    /// Create a format from a shared renderer.
    pub fn from_arc(name: impl Into<String>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            name: name.into(),
            renderer,
        }
    }

    /// Create a format named after the renderer's own format.
    pub fn of(renderer: impl Renderer + 'static) -> Self {
        let name = renderer.format().to_string();
        Self::new(name, renderer)
    }

    /// Format name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renderer for this format.
    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Format")
            .field("name", &self.name)
            .field("renderer", &self.renderer.name())
            .finish()
    }
}

#[derive(Clone)]
struct OutputConfig {
    formats: Vec<Format>,
    writers: Vec<Arc<dyn Writer>>,
    transformers: Vec<Arc<dyn Transformer>>,
    progress: Arc<dyn Progress>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            formats: Vec::new(),
            writers: Vec::new(),
            transformers: Vec::new(),
            progress: Arc::new(NoProgress),
        }
    }
}

/// Renders documents to several formats and writers at once.
///
/// Configuration may be changed through `&self` (`add_*`, `set_progress`)
/// while renders run; each render works on a snapshot taken when it starts.
#[derive(Default)]
pub struct Output {
    config: RwLock<OutputConfig>,
}

impl Output {
    /// Create an empty orchestrator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a format.
    pub fn with_format(self, format: Format) -> Self {
        self.add_format(format);
        self
    }

    /// Add a format named after the renderer's own format.
    pub fn with_renderer(self, renderer: impl Renderer + 'static) -> Self {
        self.with_format(Format::of(renderer))
    }

    /// Add a writer.
    pub fn with_writer(self, writer: impl Writer + 'static) -> Self {
        self.with_writer_arc(Arc::new(writer))
    }

    /// Add a shared writer.
    pub fn with_writer_arc(self, writer: Arc<dyn Writer>) -> Self {
        self.add_writer(writer);
        self
    }

    /// Add a transformer.
    pub fn with_transformer(self, transformer: impl Transformer + 'static) -> Self {
        self.add_transformer(Arc::new(transformer));
        self
    }

    /// Set the progress sink.
    pub fn with_progress(self, progress: Arc<dyn Progress>) -> Self {
        self.set_progress(progress);
        self
    }

    /// Add a format to a shared instance.
    pub fn add_format(&self, format: Format) {
        self.write_config().formats.push(format);
    }

    /// Add a writer to a shared instance.
    pub fn add_writer(&self, writer: Arc<dyn Writer>) {
        self.write_config().writers.push(writer);
    }

    /// Add a transformer to a shared instance.
    pub fn add_transformer(&self, transformer: Arc<dyn Transformer>) {
        self.write_config().transformers.push(transformer);
    }

    /// Replace the progress sink of a shared instance.
    pub fn set_progress(&self, progress: Arc<dyn Progress>) {
        self.write_config().progress = progress;
    }

    /// Names of the configured formats, in registration order.
    pub fn format_names(&self) -> Vec<String> {
        self.read_config()
            .formats
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }

    /// Number of configured writers.
    pub fn writer_count(&self) -> usize {
        self.read_config().writers.len()
    }

    /// Number of configured transformers.
    pub fn transformer_count(&self) -> usize {
        self.read_config().transformers.len()
    }

    fn read_config(&self) -> RwLockReadGuard<'_, OutputConfig> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_config(&self) -> RwLockWriteGuard<'_, OutputConfig> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Render `doc` to every format and write it to every writer.
    ///
    /// Returns [`Error::Config`] before doing any work when no format or no
    /// writer is configured, and [`Error::Multi`] when any format failed.
    /// Output already written by successful steps is kept.
    pub fn render(&self, cx: &Context, doc: &Document) -> Result<()> {
        let config = self.read_config().clone();

        if config.formats.is_empty() {
            return Err(Error::Config("no output formats configured".to_string()));
        }
        if config.writers.is_empty() {
            return Err(Error::Config("no writers configured".to_string()));
        }

        let total = config.formats.len() * config.writers.len();
        let progress = config.progress.as_ref();
        progress.set_total(total as u64);
        log::debug!(
            "rendering {} format(s) to {} writer(s)",
            config.formats.len(),
            config.writers.len()
        );

        let completed = Mutex::new(0u64);
        let (tx, rx) = crossbeam_channel::bounded(total);

        thread::scope(|scope| {
            for format in &config.formats {
                let tx = tx.clone();
                let job = FormatJob {
                    cx,
                    doc,
                    format,
                    config: &config,
                    completed: &completed,
                };
                scope.spawn(move || job.run(&tx));
            }
        });
        drop(tx);

        let errors = MultiError::from(rx.try_iter().collect::<Vec<_>>());
        if errors.is_empty() {
            log::info!("rendered {} format(s), {} write(s)", config.formats.len(), total);
            progress.complete();
            Ok(())
        } else {
            let err = Error::Multi(errors);
            log::warn!("render finished with errors: {}", err);
            progress.fail(&err);
            Err(err)
        }
    }

    /// Run [`Output::render`] on tokio's blocking pool.
    #[cfg(feature = "async")]
    pub async fn render_async(self: Arc<Self>, cx: Context, doc: Arc<Document>) -> Result<()> {
        tokio::task::spawn_blocking(move || self.render(&cx, &doc))
            .await
            .map_err(|e| Error::Other(format!("render task failed: {}", e)))?
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.read_config();
        f.debug_struct("Output")
            .field("formats", &config.formats)
            .field(
                "writers",
                &config.writers.iter().map(|w| w.name()).collect::<Vec<_>>(),
            )
            .field(
                "transformers",
                &config.transformers.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Work of one format thread.
struct FormatJob<'a> {
    cx: &'a Context,
    doc: &'a Document,
    format: &'a Format,
    config: &'a OutputConfig,
    completed: &'a Mutex<u64>,
}

impl FormatJob<'_> {
    fn run(&self, errors: &Sender<OutputError>) {
        let name = self.format.name();

        if let Some(cause) = self.cx.err() {
            log::debug!("format '{}': cancelled before render", name);
            self.report(errors, OutputError::Cancelled {
                format: name.to_string(),
                stage: "render".to_string(),
                cause,
            });
            return;
        }

        let data = match self.render() {
            Ok(data) => data,
            Err(e) => {
                self.report(errors, e);
                return;
            }
        };

        let data = match self.transform(data) {
            Ok(data) => data,
            Err(e) => {
                self.report(errors, e);
                return;
            }
        };

        for writer in &self.config.writers {
            if let Some(cause) = self.cx.err() {
                self.report(errors, OutputError::Cancelled {
                    format: name.to_string(),
                    stage: format!("write to {}", writer.name()),
                    cause,
                });
                return;
            }

            let label = format!("writer {}", writer.name());
            match component_guarded(&label, || writer.write(self.cx, name, &data)) {
                Ok(()) => {
                    log::debug!("format '{}': wrote {} bytes to {}", name, data.len(), writer.name());
                    let mut completed = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
                    *completed += 1;
                    self.config.progress.set_current(*completed);
                }
                Err(source) => self.report(errors, OutputError::Write {
                    format: name.to_string(),
                    writer: writer.name().to_string(),
                    data_size: data.len(),
                    source: Box::new(source),
                }),
            }
        }
    }

    fn render(&self) -> std::result::Result<Vec<u8>, OutputError> {
        let renderer = self.format.renderer();
        let label = format!("renderer {}", renderer.name());
        let mut buf = Vec::new();

        let result = if renderer.supports_streaming() {
            component_guarded(&label, || renderer.render_to(self.cx, self.doc, &mut buf))
        } else {
            component_guarded(&label, || renderer.render(self.cx, self.doc)).map(|data| buf = data)
        };

        match result {
            Ok(()) => {
                log::debug!("format '{}': rendered {} bytes", self.format.name(), buf.len());
                Ok(buf)
            }
            Err(source) => Err(OutputError::Render {
                format: self.format.name().to_string(),
                renderer: renderer.name().to_string(),
                output_size: buf.len(),
                source: Box::new(source),
            }),
        }
    }

    fn transform(&self, mut data: Vec<u8>) -> std::result::Result<Vec<u8>, OutputError> {
        let name = self.format.name();
        for transformer in applicable(&self.config.transformers, name) {
            let label = format!("transformer {}", transformer.name());
            data = component_guarded(&label, || transformer.transform(self.cx, &data, name))
                .map_err(|source| OutputError::Transform {
                    format: name.to_string(),
                    transformer: transformer.name().to_string(),
                    source: Box::new(source),
                })?;
            log::debug!("format '{}': applied transformer {}", name, transformer.name());
        }
        Ok(data)
    }

    fn report(&self, errors: &Sender<OutputError>, error: OutputError) {
        log::warn!("{}", error);
        // capacity covers one error per (format, writer) pair
        let _ = errors.send(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Component;
    use crate::model::{Content, Table};
    use crate::render::{JsonRenderer, TextRenderer};
    use crate::write::MemoryWriter;

    fn doc() -> Document {
        Document::new(vec![Content::table("t", Table::new(["a"]))])
    }

    #[test]
    fn test_missing_formats_or_writers() {
        let err = Output::new()
            .with_writer(MemoryWriter::new())
            .render(&Context::background(), &doc())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Output::new()
            .with_renderer(TextRenderer::default())
            .render(&Context::background(), &doc())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_render_all_formats() {
        let memory = Arc::new(MemoryWriter::new());
        let output = Output::new()
            .with_renderer(TextRenderer::default())
            .with_renderer(JsonRenderer::default())
            .with_writer_arc(memory.clone());

        output.render(&Context::background(), &doc()).unwrap();
        assert_eq!(memory.formats(), vec!["json", "text"]);
        assert_eq!(memory.get_string("text").unwrap(), "a\n\n");
    }

    #[test]
    fn test_cancelled_before_render() {
        let memory = Arc::new(MemoryWriter::new());
        let output = Output::new()
            .with_renderer(TextRenderer::default())
            .with_writer_arc(memory.clone());

        let cx = Context::background();
        cx.cancel();
        let err = output.render(&cx, &doc()).unwrap_err();
        assert!(err.is_cancellation());
        match err {
            Error::Multi(m) => {
                assert_eq!(m.len(), 1);
                assert_eq!(m.errors()[0].component(), Component::Cancellation);
                assert_eq!(m.errors()[0].component_name(), "render");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(memory.is_empty());
    }

    #[test]
    fn test_shared_configuration() {
        let output = Output::new();
        output.add_format(Format::new("plain", TextRenderer::default()));
        output.add_writer(Arc::new(MemoryWriter::new()));
        assert_eq!(output.format_names(), vec!["plain"]);
        assert_eq!(output.writer_count(), 1);
        assert_eq!(output.transformer_count(), 0);
        assert!(output.render(&Context::background(), &doc()).is_ok());
    }

    #[test]
    fn test_panicking_renderer_is_reported() {
        struct Boom;

        impl Renderer for Boom {
            fn format(&self) -> &str {
                "boom"
            }

            fn render_to(&self, _cx: &Context, _doc: &Document, _sink: &mut dyn std::io::Write) -> Result<()> {
                panic!("renderer exploded")
            }
        }

        let memory = Arc::new(MemoryWriter::new());
        let output = Output::new()
            .with_renderer(Boom)
            .with_renderer(TextRenderer::default())
            .with_writer_arc(memory.clone());

        let err = output.render(&Context::background(), &doc()).unwrap_err();
        match err {
            Error::Multi(m) => {
                assert_eq!(m.len(), 1);
                assert_eq!(m.errors()[0].format(), "boom");
                assert_eq!(m.errors()[0].component(), Component::Renderer);
                assert!(m.to_string().contains("renderer exploded"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(memory.formats(), vec!["text"]);
    }
}
