//! Directory-backed writer.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::Writer;
use crate::context::Context;
use crate::error::Result;

/// Writes one file per format into a directory.
///
/// Files are named `<stem>.<extension>`; the extension is looked up per
/// format (`json` → `.json`, `markdown` → `.md`, `text` → `.txt`) and falls
/// back to the format name. The directory is created on first write.
#[derive(Debug, Clone)]
pub struct FileWriter {
    dir: PathBuf,
    stem: String,
    extensions: BTreeMap<String, String>,
}

impl FileWriter {
    /// Create a writer targeting `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let extensions = [("json", "json"), ("markdown", "md"), ("text", "txt")]
            .into_iter()
            .map(|(f, e)| (f.to_string(), e.to_string()))
            .collect();
        Self {
            dir: dir.into(),
            stem: "output".to_string(),
            extensions,
        }
    }

    /// Set the file stem (default `output`).
    pub fn with_stem(mut self, stem: impl Into<String>) -> Self {
        self.stem = stem.into();
        self
    }

    /// Override the file extension used for a format.
    pub fn with_extension(mut self, format: impl Into<String>, extension: impl Into<String>) -> Self {
        self.extensions.insert(format.into(), extension.into());
        self
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the given format is written to.
    pub fn path_for(&self, format: &str) -> PathBuf {
        let extension = self
            .extensions
            .get(format)
            .map(String::as_str)
            .unwrap_or(format);
        self.dir.join(format!("{}.{}", self.stem, extension))
    }
}

impl Writer for FileWriter {
    fn write(&self, _cx: &Context, format: &str, data: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(format);
        fs::write(&path, data)?;
        log::debug!("wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}
