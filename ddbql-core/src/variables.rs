//! `${NAME}` template expansion applied to raw input before tokenizing.

use std::collections::BTreeMap;

/// Reserved name expanding to a fresh v4 UUID on every occurrence.
pub const UUID_VARIABLE: &str = "UUID";
/// Reserved name expanding to the current time in tenths of a second.
pub const NOW_VARIABLE: &str = "NOW";

/// User variables set with `@name = value;`
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: BTreeMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Variables sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Expand every `${...}` in `src`.
    ///
    /// Braces nest, so `${a{b}}` looks up `a{b}`. An empty name expands to
    /// nothing and an unknown name expands to the empty string.
    pub fn substitute(&self, src: &str) -> String {
        let mut out = String::with_capacity(src.len());
        let mut chars = src.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' || chars.peek() != Some(&'{') {
                out.push(c);
                continue;
            }
            chars.next();

            let mut depth = 1usize;
            let mut name = String::new();
            for c in chars.by_ref() {
                match c {
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    _ => {}
                }
                if depth == 0 {
                    break;
                }
                name.push(c);
            }

            if !name.is_empty() {
                out.push_str(&self.resolve(&name));
            }
        }
        out
    }

    fn resolve(&self, name: &str) -> String {
        match name {
            UUID_VARIABLE => uuid::Uuid::new_v4().to_string(),
            NOW_VARIABLE => coarse_now().to_string(),
            _ => self.get(name).unwrap_or_default().to_string(),
        }
    }
}

/// Milliseconds since the epoch divided by 100.
pub fn coarse_now() -> i64 {
    chrono::Utc::now().timestamp_millis() / 100
}
