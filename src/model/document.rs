//! Document-level types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::Content;

/// An ordered, immutable collection of content plus metadata.
///
/// Rendering never mutates a document; renders of the same document may run
/// concurrently.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    title: Option<String>,
    metadata: BTreeMap<String, String>,
    contents: Vec<Content>,
    created: Option<DateTime<Utc>>,
}

impl Document {
    /// Create a document from its contents.
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            ..Self::default()
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the creation timestamp.
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Document title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Metadata map.
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Get a metadata value.
    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    /// Creation timestamp.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    /// Top-level contents in order.
    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    /// Number of top-level content items.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Check if the document has no content.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Find a content item by identifier, searching nested sections.
    pub fn find(&self, id: &str) -> Option<&Content> {
        fn search<'a>(items: &'a [Content], id: &str) -> Option<&'a Content> {
            for item in items {
                if item.id() == id {
                    return Some(item);
                }
                if let Some(found) = search(item.children(), id) {
                    return Some(found);
                }
            }
            None
        }
        search(&self.contents, id)
    }

    /// Total number of content items, including nested ones.
    pub fn total_items(&self) -> usize {
        fn count(items: &[Content]) -> usize {
            items.iter().map(|c| 1 + count(c.children())).sum()
        }
        count(&self.contents)
    }

    /// Convert title, creation date and metadata to YAML frontmatter.
    pub fn to_yaml_frontmatter(&self) -> String {
        let mut lines = vec!["---".to_string()];

        if let Some(ref title) = self.title {
            lines.push(format!("title: \"{}\"", escape_yaml(title)));
        }
        if let Some(ref created) = self.created {
            lines.push(format!("created: {}", created.to_rfc3339()));
        }
        for (key, value) in &self.metadata {
            lines.push(format!("{}: \"{}\"", key, escape_yaml(value)));
        }

        lines.push("---".to_string());
        lines.push(String::new());

        lines.join("\n")
    }
}

/// Escape special characters for YAML strings.
fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
