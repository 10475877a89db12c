/// Interactive line source for the ddbql shell
///
/// Provides line editing, persistent history and keyword completion on top of
/// rustyline. Statement handling lives in the engine; this only reads lines.

use anyhow::{Context, Result};
use colored::Colorize;
use ddbql_core::{Line, Prompt, CONTINUATION_PROMPT};
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{
    completion::{Completer, Pair},
    highlight::Highlighter,
    hint::Hinter,
    validate::Validator,
    Editor, Helper,
};
use std::path::PathBuf;
use tracing::warn;

const HISTORY_FILE: &str = ".ddbql_history";

const VERBS: &[&str] = &[
    "sleep", "clear", "exit", "connect", "echo", "run;", "!h", "!c", "!v", "!?",
];

const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "LIMIT", "INSERT", "INTO", "VALUE", "UPDATE", "SET", "REMOVE",
    "DELETE", "AND", "OR", "NOT", "DESC", "CREATE", "TABLE", "INDEX", "LOCAL", "GLOBAL", "HASH",
    "RANGE", "DROP", "IF", "EXISTS", "SHOW", "TABLES", "TRUNCATE",
];

/// Completes built-in verbs at the start of a line and keywords elsewhere
#[derive(Clone, Default)]
struct ShellCompleter;

impl ShellCompleter {
    fn complete_keyword(word: &str) -> Vec<Pair> {
        let word_upper = word.to_uppercase();
        KEYWORDS
            .iter()
            .filter(|kw| kw.starts_with(&word_upper))
            .map(|kw| Pair {
                display: kw.to_string(),
                replacement: kw.to_string(),
            })
            .collect()
    }
}

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_prefix = &line[..pos];

        if let Some(last_space) = line_prefix.rfind(char::is_whitespace) {
            let word_start = last_space + 1;
            return Ok((word_start, Self::complete_keyword(&line_prefix[word_start..])));
        }

        let mut candidates: Vec<Pair> = VERBS
            .iter()
            .filter(|verb| verb.starts_with(line_prefix))
            .map(|verb| Pair {
                display: verb.to_string(),
                replacement: verb.to_string(),
            })
            .collect();
        candidates.extend(Self::complete_keyword(line_prefix));
        Ok((0, candidates))
    }
}

impl Hinter for ShellCompleter {
    type Hint = String;
}

impl Highlighter for ShellCompleter {}

impl Validator for ShellCompleter {}

impl Helper for ShellCompleter {}

/// rustyline-backed [`Prompt`]
pub struct Shell {
    editor: Editor<ShellCompleter, FileHistory>,
    history_path: PathBuf,
}

impl Shell {
    pub fn new() -> Result<Self> {
        let mut editor = Editor::new().context("Failed to initialize line editor")?;
        editor.set_helper(Some(ShellCompleter));

        let history_path = dirs::home_dir()
            .map(|p| p.join(HISTORY_FILE))
            .unwrap_or_else(|| HISTORY_FILE.into());
        if history_path.exists() {
            let _ = editor.load_history(&history_path);
        }

        Ok(Self {
            editor,
            history_path,
        })
    }

    pub fn save_history(&mut self) -> Result<()> {
        self.editor
            .save_history(&self.history_path)
            .context("Failed to save command history")
    }
}

impl Prompt for Shell {
    fn read_line(&mut self, prompt: &str) -> Line {
        let styled = if prompt == CONTINUATION_PROMPT {
            prompt.dimmed().to_string()
        } else {
            prompt.green().bold().to_string()
        };

        match self.editor.readline(&styled) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Line::Text(line)
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                Line::Interrupted
            }
            Err(ReadlineError::Eof) => Line::Eof,
            Err(err) => {
                warn!(error = %err, "error reading line");
                Line::Eof
            }
        }
    }
}
