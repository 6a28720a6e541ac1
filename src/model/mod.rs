//! Document model types.
//!
//! A [`Document`] is an ordered list of [`Content`] items. Each item has a
//! typed [`ContentBody`] and an ordered, fixed list of operations that the
//! pipeline runs immediately before the item is serialized.

mod content;
mod document;
mod table;
mod value;

pub use content::{Chart, ChartKind, Content, ContentBody, Diagram, Edge, Graph, Series, Text};
pub use document::Document;
pub use table::{CellFormatter, Table};
pub use value::{as_number, compare_values, display_value, record, Record, Value};
