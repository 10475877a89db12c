//! Character-level tokenizer shared by every statement parser.
//!
//! Tokens are produced lazily through [`Iterator::next`]. Two mode flags can be
//! flipped between calls: enclosing-quote mode keeps the quote characters around
//! a literal, include-space mode returns a run of spaces as a single `" "` token.

/// Text of the token produced for a run of spaces in include-space mode.
pub const SPACE: &str = " ";

/// Lexer over one command string.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    rest: &'a str,
    text: Option<String>,
    include_enclose: bool,
    include_space: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            rest: input,
            text: None,
            include_enclose: false,
            include_space: false,
        }
    }

    /// Keep the surrounding quote characters of quoted literals.
    pub fn set_include_enclose(&mut self, on: bool) {
        self.include_enclose = on;
    }

    /// Return runs of spaces as a single space token instead of skipping them.
    pub fn set_include_space(&mut self, on: bool) {
        self.include_space = on;
    }

    /// Text of the token most recently returned by `next`.
    pub fn current_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn emit(&mut self, token: String) -> String {
        self.text = Some(token.clone());
        token
    }

    fn scan_quoted(&mut self, quote: char) -> String {
        let mut out = String::new();
        if self.include_enclose {
            out.push(quote);
        }

        let mut chars = self.rest.chars();
        let mut closed = false;
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => break,
                },
                c if c == quote => {
                    closed = true;
                    break;
                }
                c => out.push(c),
            }
        }
        self.rest = chars.as_str();

        if self.include_enclose && closed {
            out.push(quote);
        }
        out
    }
}

impl Iterator for Lexer<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let mut chars = self.rest.chars();
            let c = chars.next()?;

            match c {
                '\r' | '\t' | '\n' => {
                    self.rest = chars.as_str();
                }
                ' ' => {
                    self.rest = self.rest.trim_start_matches(' ');
                    if self.include_space {
                        return Some(self.emit(SPACE.to_string()));
                    }
                }
                '\'' | '"' => {
                    self.rest = chars.as_str();
                    let literal = self.scan_quoted(c);
                    return Some(self.emit(literal));
                }
                c if is_word_char(c) => {
                    let end = self
                        .rest
                        .find(|ch: char| !is_word_char(ch))
                        .unwrap_or(self.rest.len());
                    let word = self.rest[..end].to_string();
                    self.rest = &self.rest[end..];
                    return Some(self.emit(word));
                }
                other => {
                    self.rest = chars.as_str();
                    return Some(self.emit(other.to_string()));
                }
            }
        }
    }
}

/// Characters that form identifier-like runs.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

pub fn is_space_token(token: &str) -> bool {
    token == SPACE
}
