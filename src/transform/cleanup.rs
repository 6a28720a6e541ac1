//! Text cleanup for rendered text formats.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::Transformer;
use crate::context::Context;
use crate::error::{Error, Result};

/// Cleanup preset levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPreset {
    /// Unicode NFC normalization only
    Minimal,
    /// NFC + ligatures + trailing whitespace + blank line limit
    #[default]
    Standard,
    /// Standard + PUA removal + whitespace run collapsing
    Aggressive,
}

/// Options for text cleanup.
#[derive(Debug, Clone)]
pub struct CleanupOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Fix ligatures (fi, fl, etc.)
    pub fix_ligatures: bool,

    /// Remove Private Use Area (PUA) characters
    pub remove_pua: bool,

    /// Remove Unicode replacement character (U+FFFD)
    pub remove_replacement_char: bool,

    /// Strip whitespace at the end of every line
    pub strip_trailing_whitespace: bool,

    /// Collapse runs of 3+ spaces to two
    pub normalize_whitespace: bool,

    /// Maximum consecutive newlines (0 = unlimited)
    pub max_consecutive_newlines: u8,

    /// Preserve YAML frontmatter during cleanup
    pub preserve_frontmatter: bool,
}

impl CleanupOptions {
    /// Create options from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Self {
        match preset {
            CleanupPreset::Minimal => Self::minimal(),
            CleanupPreset::Standard => Self::standard(),
            CleanupPreset::Aggressive => Self::aggressive(),
        }
    }

    /// Minimal cleanup options.
    pub fn minimal() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: false,
            remove_pua: false,
            remove_replacement_char: false,
            strip_trailing_whitespace: false,
            normalize_whitespace: false,
            max_consecutive_newlines: 0,
            preserve_frontmatter: true,
        }
    }

    /// Standard cleanup options.
    pub fn standard() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: true,
            remove_pua: false,
            remove_replacement_char: true,
            strip_trailing_whitespace: true,
            normalize_whitespace: false,
            max_consecutive_newlines: 2,
            preserve_frontmatter: true,
        }
    }

    /// Aggressive cleanup options.
    pub fn aggressive() -> Self {
        Self {
            remove_pua: true,
            normalize_whitespace: true,
            ..Self::standard()
        }
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self::standard()
    }
}

const LIGATURES: [(&str, &str); 7] = [
    ("\u{FB00}", "ff"),
    ("\u{FB01}", "fi"),
    ("\u{FB02}", "fl"),
    ("\u{FB03}", "ffi"),
    ("\u{FB04}", "ffl"),
    ("\u{FB05}", "st"),
    ("\u{FB06}", "st"),
];

/// Cleans up UTF-8 text output (`markdown` and `text` by default).
#[derive(Debug, Clone)]
pub struct CleanupTransformer {
    options: CleanupOptions,
    formats: Vec<String>,
    priority: i32,
    trailing_ws: Regex,
    space_runs: Regex,
    newline_runs: Option<Regex>,
}

impl CleanupTransformer {
    /// Create a cleanup transformer with the given options.
    pub fn new(options: CleanupOptions) -> Result<Self> {
        let newline_runs = match options.max_consecutive_newlines {
            0 => None,
            max => Some(compile(&format!(r"\n{{{},}}", max as usize + 1))?),
        };
        Ok(Self {
            options,
            formats: vec!["markdown".to_string(), "text".to_string()],
            priority: 10,
            trailing_ws: compile(r"(?m)[ \t]+$")?,
            space_runs: compile(r"[ ]{3,}")?,
            newline_runs,
        })
    }

    /// Create a cleanup transformer from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Result<Self> {
        Self::new(CleanupOptions::from_preset(preset))
    }

    /// Restrict the formats this transformer applies to.
    pub fn with_formats<S: Into<String>>(mut self, formats: impl IntoIterator<Item = S>) -> Self {
        self.formats = formats.into_iter().map(Into::into).collect();
        self
    }

    /// Set the ordering priority (default 10).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Clean up a string.
    pub fn process(&self, text: &str) -> String {
        let frontmatter = if self.options.preserve_frontmatter {
            extract_frontmatter(text)
        } else {
            None
        };

        match frontmatter {
            Some((fm, content)) => format!("{}\n{}", fm, self.process_content(content)),
            None => self.process_content(text),
        }
    }

    fn process_content(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.options.normalize_unicode {
            result = result.nfc().collect();
        }

        if self.options.fix_ligatures {
            for (ligature, replacement) in LIGATURES {
                result = result.replace(ligature, replacement);
            }
        }

        if self.options.remove_pua {
            result = result.chars().filter(|c| !is_pua(*c)).collect();
        }

        if self.options.remove_replacement_char {
            result = result.replace('\u{FFFD}', "");
        }

        if self.options.strip_trailing_whitespace {
            result = self.trailing_ws.replace_all(&result, "").into_owned();
        }

        if self.options.normalize_whitespace {
            result = self.space_runs.replace_all(&result, "  ").into_owned();
        }

        if let Some(ref re) = self.newline_runs {
            let replacement = "\n".repeat(self.options.max_consecutive_newlines as usize);
            result = re.replace_all(&result, replacement.as_str()).into_owned();
        }

        let mut result = result.trim().to_string();
        if !result.is_empty() {
            result.push('\n');
        }
        result
    }
}

impl Transformer for CleanupTransformer {
    fn name(&self) -> &str {
        "cleanup"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_transform(&self, format: &str) -> bool {
        self.formats.iter().any(|f| f == format)
    }

    fn transform(&self, _cx: &Context, data: &[u8], format: &str) -> Result<Vec<u8>> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::Other(format!("{} output is not UTF-8: {}", format, e)))?;
        Ok(self.process(text).into_bytes())
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Config(format!("invalid cleanup pattern: {}", e)))
}

fn extract_frontmatter(text: &str) -> Option<(&str, &str)> {
    let stripped = text.strip_prefix("---\n")?;
    let end_pos = stripped.find("\n---\n")?;
    let fm_end = 4 + end_pos + 5;
    Some((&text[..fm_end], &text[fm_end..]))
}

fn is_pua(c: char) -> bool {
    let code = c as u32;
    (0xE000..=0xF8FF).contains(&code)
        || (0xF0000..=0xFFFFD).contains(&code)
        || (0x100000..=0x10FFFD).contains(&code)
}
