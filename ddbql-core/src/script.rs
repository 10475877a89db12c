//! Script files and the stack of active input sources.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// A finite, non-restartable sequence of lines loaded from a file
#[derive(Debug)]
pub struct ScriptSource {
    name: String,
    lines: std::vec::IntoIter<String>,
}

impl ScriptSource {
    /// Load a script file. A missing file is [`Error::ScriptNotFound`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::ScriptNotFound(PathBuf::from(path)));
        }
        let text = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded script file");
        Ok(Self::from_text(path.display().to_string(), &text))
    }

    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        Self {
            name: name.into(),
            lines: lines.into_iter(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Iterator for ScriptSource {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.lines.next()
    }
}

/// Stack of script sources; the top one is read first
#[derive(Debug, Default)]
pub struct ScriptStack {
    sources: Vec<ScriptSource>,
}

impl ScriptStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: ScriptSource) {
        self.sources.push(source);
    }

    /// Next line from the active source, popping exhausted sources.
    pub fn next_line(&mut self) -> Option<String> {
        while let Some(top) = self.sources.last_mut() {
            if let Some(line) = top.next() {
                return Some(line);
            }
            debug!(script = %top.name(), "script exhausted");
            self.sources.pop();
        }
        None
    }

    pub fn depth(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn clear(&mut self) {
        self.sources.clear();
    }
}
