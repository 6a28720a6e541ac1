//! Standard stream writers.

use std::io::{self, Write as _};

use super::Writer;
use crate::context::Context;
use crate::error::Result;

/// Writes every format to standard output.
///
/// With headers enabled, each format is preceded by a `==> format <==` line.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutWriter {
    headers: bool,
}

impl StdoutWriter {
    /// Create a stdout writer without headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Print a header line before each format.
    pub fn with_headers(mut self, headers: bool) -> Self {
        self.headers = headers;
        self
    }
}

impl Writer for StdoutWriter {
    fn write(&self, _cx: &Context, format: &str, data: &[u8]) -> Result<()> {
        let mut out = io::stdout().lock();
        write_block(&mut out, self.headers, format, data)
    }
}

/// Writes every format to standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrWriter {
    headers: bool,
}

impl StderrWriter {
    /// Create a stderr writer without headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Print a header line before each format.
    pub fn with_headers(mut self, headers: bool) -> Self {
        self.headers = headers;
        self
    }
}

impl Writer for StderrWriter {
    fn write(&self, _cx: &Context, format: &str, data: &[u8]) -> Result<()> {
        let mut err = io::stderr().lock();
        write_block(&mut err, self.headers, format, data)
    }
}

fn write_block(out: &mut dyn io::Write, headers: bool, format: &str, data: &[u8]) -> Result<()> {
    if headers {
        writeln!(out, "==> {} <==", format)?;
    }
    out.write_all(data)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_block_headers() {
        let mut buf = Vec::new();
        write_block(&mut buf, true, "json", b"{}\n").unwrap();
        assert_eq!(buf, b"==> json <==\n{}\n");

        let mut buf = Vec::new();
        write_block(&mut buf, false, "json", b"{}").unwrap();
        assert_eq!(buf, b"{}");
    }

    #[test]
    fn test_names() {
        assert_eq!(StdoutWriter::new().name(), "StdoutWriter");
        assert_eq!(StderrWriter::new().with_headers(true).name(), "StderrWriter");
    }
}
