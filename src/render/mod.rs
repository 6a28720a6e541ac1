//! Rendering of documents into output formats.
//!
//! A [`Renderer`] serializes a [`Document`] into bytes for one format. Every
//! renderer runs the operation pipeline of each content item it visits and
//! stops with [`Error::Cancelled`] as soon as the context is done.

mod json;
mod markdown;
mod options;
mod text;

pub use json::{to_json, JsonFormat, JsonRenderer};
pub use markdown::{to_markdown, MarkdownRenderer};
pub use options::{RenderOptions, TableFallback};
pub use text::{to_text, TextRenderer};

use std::borrow::Cow;
use std::io;

use crate::context::Context;
use crate::error::Result;
use crate::model::{Content, Document};
use crate::pipeline::apply_transformations;

/// Serializes a document into one output format.
pub trait Renderer: Send + Sync {
    /// Format name this renderer produces (e.g. "markdown").
    fn format(&self) -> &str;

    /// Render the whole document into a buffer.
    fn render(&self, cx: &Context, doc: &Document) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.render_to(cx, doc, &mut buf)?;
        Ok(buf)
    }

    /// Render the document into a sink.
    ///
    /// On failure, streaming renderers leave whatever they produced so far
    /// in the sink.
    fn render_to(&self, cx: &Context, doc: &Document, sink: &mut dyn io::Write) -> Result<()>;

    /// Whether `render_to` writes incrementally.
    fn supports_streaming(&self) -> bool {
        false
    }

    /// Identity used in error reports. Defaults to the type name.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Check the context, then run the operations attached to `content`.
pub(crate) fn prepare<'a>(cx: &Context, content: &'a Content) -> Result<Cow<'a, Content>> {
    cx.check()?;
    Ok(apply_transformations(cx, content)?)
}

/// Last path segment of a type name, without generic arguments.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::Table;
    use crate::ops::Limit;

    struct Fixed;

    impl Renderer for Fixed {
        fn format(&self) -> &str {
            "fixed"
        }

        fn render_to(&self, _cx: &Context, _doc: &Document, sink: &mut dyn io::Write) -> Result<()> {
            sink.write_all(b"fixed")?;
            Ok(())
        }
    }

    #[test]
    fn test_default_name_and_render() {
        let r = Fixed;
        assert_eq!(r.name(), "Fixed");
        assert!(!r.supports_streaming());
        let out = r.render(&Context::background(), &Document::default()).unwrap();
        assert_eq!(out, b"fixed");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::C"), "C");
        assert_eq!(short_type_name("a::Wrap<b::C>"), "Wrap");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_prepare_checks_context() {
        let content = Content::table("t", Table::new(["a"])).with_operation(Limit::new(1));
        let cx = Context::background();
        assert!(prepare(&cx, &content).is_ok());

        cx.cancel();
        let err = prepare(&cx, &content).unwrap_err();
        assert!(matches!(err, Error::Cancelled(_)));
    }
}
