use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Tails an output file of a running job so its progress can be inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracker {
    pub filename: String,
    pub nlines: usize,
    #[serde(default)]
    pub allow_zipped: bool,
    #[serde(default)]
    pub content: String,
}

impl Tracker {
    pub fn new(filename: impl Into<String>, nlines: usize, allow_zipped: bool) -> Self {
        Self {
            filename: filename.into(),
            nlines,
            allow_zipped,
            content: String::new(),
        }
    }

    /// Reads the last `nlines` lines of the tracked file in `dir` into `content`.
    ///
    /// Returns `Ok(false)` when the file does not exist. With `allow_zipped`, a
    /// missing file falls back to its gzipped `<filename>.gz` sibling.
    pub fn track(&mut self, dir: &Path) -> io::Result<bool> {
        let path = dir.join(&self.filename);
        let text = if path.exists() {
            std::fs::read_to_string(&path)?
        } else {
            let zipped = dir.join(format!("{}.gz", self.filename));
            if !(self.allow_zipped && zipped.exists()) {
                return Ok(false);
            }
            let mut text = String::new();
            GzDecoder::new(File::open(&zipped)?).read_to_string(&mut text)?;
            text
        };
        self.content = tail(&text, self.nlines);
        Ok(true)
    }
}

fn tail(text: &str, nlines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(nlines);
    lines[start..].join("\n")
}
