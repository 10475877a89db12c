//! Command dispatcher and REPL state machine.
//!
//! A [`Session`] owns everything that survives between commands: variables,
//! history, the script stack, the pending multi-line buffer and the
//! continuation token of the last paginated query. Input is processed one line
//! at a time; a line ending in `;` closes the buffer and runs it.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::builtin::{Builtin, Introspection, HELP_TEXT};
use crate::complement::complement;
use crate::config::{ConnectionArgs, ShellConfig};
use crate::ddl;
use crate::error::{CommandKind, Error, Result};
use crate::history::History;
use crate::lex::{is_space_token, Lexer};
use crate::reporter::Reporter;
use crate::script::{ScriptSource, ScriptStack};
use crate::storage::{extract_key, Connector, StorageAccess, TableDescription};
use crate::types::item_to_json;
use crate::variables::Variables;

/// Prompt shown when no statement is pending
pub const PROMPT: &str = "ddbql> ";
/// Prompt shown while a multi-line statement is being entered
pub const CONTINUATION_PROMPT: &str = "...> ";

/// One read from an interactive input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Text(String),
    /// The user cancelled the current input (Ctrl+C)
    Interrupted,
    /// No more input (Ctrl+D)
    Eof,
}

/// Interactive line source used once the script stack is empty.
pub trait Prompt {
    fn read_line(&mut self, prompt: &str) -> Line;
}

/// Whether the loop keeps reading after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Outcome of a built-in verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Skip,
    View,
    Clear,
    Reconnect,
    End,
}

pub struct Session {
    config: ShellConfig,
    connector: Box<dyn Connector>,
    storage: Box<dyn StorageAccess>,
    reporter: Box<dyn Reporter>,
    variables: Variables,
    history: History,
    scripts: ScriptStack,
    buffer: String,
    next_token: Option<String>,
}

impl Session {
    /// Start a session, building the first storage client through `connector`.
    pub fn new(
        config: ShellConfig,
        connector: Box<dyn Connector>,
        reporter: Box<dyn Reporter>,
    ) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        let storage = connector.connect(&config.connection)?;
        let history = History::with_capacity(config.history_capacity);

        Ok(Self {
            config,
            connector,
            storage,
            reporter,
            variables: Variables::new(),
            history,
            scripts: ScriptStack::new(),
            buffer: String::new(),
            next_token: None,
        })
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Continuation token remembered from the last query
    pub fn next_token(&self) -> Option<&str> {
        self.next_token.as_deref()
    }

    /// Statement text accumulated so far
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn script_depth(&self) -> usize {
        self.scripts.depth()
    }

    pub fn prompt_label(&self) -> &'static str {
        if self.buffer.is_empty() {
            PROMPT
        } else {
            CONTINUATION_PROMPT
        }
    }

    /// Push a script file onto the input stack.
    pub fn load_script(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let source = ScriptSource::load(path)?;
        self.scripts.push(source);
        Ok(())
    }

    /// Run until input is exhausted or `exit`.
    ///
    /// Without a prompt the session is in batch mode: it ends when the script
    /// stack is empty and the first failure aborts the run unless `no_stop`
    /// is set. With a prompt, failures are reported and the loop continues.
    pub fn run(&mut self, mut prompt: Option<&mut dyn Prompt>) -> Result<()> {
        let batch = prompt.is_none();

        loop {
            let line = match self.scripts.next_line() {
                Some(line) => line,
                None => match prompt.as_mut() {
                    None => {
                        debug!("script input is over");
                        return Ok(());
                    }
                    Some(prompt) => match prompt.read_line(self.prompt_label()) {
                        Line::Text(text) => text,
                        Line::Interrupted => {
                            self.buffer.clear();
                            continue;
                        }
                        Line::Eof => return Ok(()),
                    },
                },
            };

            match self.feed(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => return Ok(()),
                Err(e) => {
                    self.reporter.error(&e.to_string());
                    if batch && !self.config.no_stop {
                        debug!(code = e.code(), "aborting script run");
                        return Err(e);
                    }
                }
            }
        }
    }

    /// Process one raw input line.
    pub fn feed(&mut self, line: &str) -> Result<Flow> {
        let input = line.trim();
        if input.is_empty() || input.starts_with('#') || input.starts_with('-') {
            return Ok(Flow::Continue);
        }

        if let Some(builtin) = Builtin::detect(input) {
            let action = match self.run_builtin(builtin, input) {
                Ok(action) => action,
                Err(e) => {
                    self.buffer.clear();
                    return Err(e);
                }
            };
            return self.apply(action);
        }

        self.buffer.push_str(input);
        self.buffer.push(' ');
        if input.ends_with(';') {
            let command = std::mem::take(&mut self.buffer);
            self.execute(command.trim())?;
        }
        Ok(Flow::Continue)
    }

    fn apply(&mut self, action: Action) -> Result<Flow> {
        match action {
            Action::Skip => {}
            Action::View => {
                let pending = self.buffer.trim_end().to_string();
                self.reporter.message(&pending);
            }
            Action::Clear => {
                self.reporter.clear();
                self.buffer.clear();
            }
            Action::Reconnect => {
                self.buffer.clear();
                self.next_token = None;
                self.storage = self.connector.connect(&self.config.connection)?;
                let connection = &self.config.connection;
                info!(
                    profile = ?connection.profile,
                    region = ?connection.region,
                    endpoint = ?connection.endpoint,
                    "reconnected"
                );
            }
            Action::End => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    fn run_builtin(&mut self, builtin: Builtin, input: &str) -> Result<Action> {
        debug!(?builtin, input, "built-in command");
        match builtin {
            Builtin::Sleep => self.sleep(input),
            Builtin::Clear => Ok(Action::Clear),
            Builtin::Exit => Ok(Action::End),
            Builtin::Introspect => Ok(self.introspect(input)),
            Builtin::Connect => {
                let args = ConnectionArgs::parse_connect(input)?;
                if self.config.connection.apply(&args) {
                    Ok(Action::Reconnect)
                } else {
                    Ok(Action::Skip)
                }
            }
            Builtin::LoadScript => {
                let path = input.split_whitespace().nth(1).ok_or_else(|| {
                    Error::syntax(CommandKind::LoadScript, input, "script file name is missing")
                })?;
                self.load_script(path)?;
                Ok(Action::Skip)
            }
            Builtin::Echo => {
                self.echo(input);
                Ok(Action::Skip)
            }
        }
    }

    fn sleep(&mut self, input: &str) -> Result<Action> {
        let mut lex = Lexer::new(input);
        let name = lex.next().unwrap_or_default();
        if name != "sleep" {
            return Err(Error::syntax(
                CommandKind::Sleep,
                input,
                format!("unknown function name [{}]", name),
            ));
        }
        let value = lex.next().unwrap_or_default();
        let millis: u64 = value.parse().map_err(|_| {
            Error::validation(
                CommandKind::Sleep,
                input,
                format!("not integer value in sleep function ({})", value),
            )
        })?;
        if let Some(extra) = lex.next().filter(|token| token != ";") {
            warn!(option = %extra, "unknown option in sleep function");
            self.reporter
                .warning(&format!("unknown option in sleep function [{}]", extra));
        }

        std::thread::sleep(Duration::from_millis(millis));
        Ok(Action::Skip)
    }

    fn introspect(&mut self, input: &str) -> Action {
        match Introspection::detect(input) {
            Some(Introspection::History) => {
                let lines: Vec<String> = self
                    .history
                    .iter()
                    .enumerate()
                    .map(|(i, command)| format!("[{}]: {}", i, command))
                    .collect();
                for line in lines {
                    self.reporter.message(&line);
                }
            }
            Some(Introspection::CurrentBuffer) => return Action::View,
            Some(Introspection::Variables) => {
                let lines: Vec<String> = self
                    .variables
                    .iter()
                    .map(|(name, value)| format!("[{}] = {}", name, value))
                    .collect();
                for line in lines {
                    self.reporter.message(&line);
                }
            }
            Some(Introspection::Help) => self.reporter.message(HELP_TEXT),
            None => self
                .reporter
                .warning(&format!("unknown command [{}], type !? for help", input)),
        }
        Action::Skip
    }

    fn echo(&mut self, input: &str) {
        let mut lex = Lexer::new(input);
        lex.set_include_space(true);
        lex.next();

        let text: String = lex.skip_while(|token| is_space_token(token)).collect();
        let text = self.variables.substitute(&text);
        self.reporter.message(&text);
    }

    /// Execute one complete command (terminated by `;`).
    pub fn execute(&mut self, command: &str) -> Result<()> {
        debug!(command, "execute command");
        if command.starts_with('@') {
            self.execute_assignment(command)
        } else if starts_with_keyword(command, "desc") {
            self.execute_desc(command)
        } else if starts_with_keyword(command, "create") {
            self.execute_create_table(command)
        } else if starts_with_keyword(command, "drop") {
            self.execute_drop_table(command)
        } else if starts_with_keyword(command, "show") {
            self.execute_show_tables(command)
        } else if starts_with_keyword(command, "truncate") {
            self.execute_truncate_table(command)
        } else if starts_with_keyword(command, "run") {
            self.execute_run()
        } else {
            self.execute_statement(command, None)
        }
    }

    fn execute_statement(&mut self, command: &str, next_token: Option<String>) -> Result<()> {
        self.next_token = None;
        if command.trim().is_empty() {
            return Err(Error::UnsupportedStatement(String::new()));
        }

        let sql = self.variables.substitute(command);
        let complemented = complement(&sql)?;
        debug!(
            statement = %complemented.statement,
            limit = ?complemented.limit,
            next_token = ?next_token,
            "complemented statement"
        );

        let output = self.storage.execute(
            &complemented.statement,
            complemented.effective_limit(),
            next_token.as_deref(),
        )?;
        debug!(items = output.items.len(), "statement executed");

        self.reporter.items(&output.items);
        if let Some(key) = &output.last_evaluated_key {
            self.reporter.document(&item_to_json(key));
        }
        if let Some(token) = output.next_token {
            self.reporter.message(&format!("NextToken: {}", token));
            self.next_token = Some(token);
        }

        self.history.push(command);
        Ok(())
    }

    /// Re-run the latest history entry from the remembered continuation token.
    fn execute_run(&mut self) -> Result<()> {
        let latest = self.history.latest().ok_or(Error::NoHistory)?.to_string();
        let next_token = self.next_token.take();
        self.execute_statement(&latest, next_token)
    }

    fn execute_assignment(&mut self, command: &str) -> Result<()> {
        let assignment = ddl::parse_assignment(&self.variables.substitute(command))?;
        debug!(name = %assignment.name, value = %assignment.value, "set variable");
        self.variables.set(assignment.name, assignment.value);
        self.history.push(command);
        Ok(())
    }

    fn execute_desc(&mut self, command: &str) -> Result<()> {
        let desc = ddl::parse_desc(&self.variables.substitute(command))?;
        let description = self.storage.describe(&desc.table_name)?;
        self.report_description(&description);
        self.history.push(command);
        Ok(())
    }

    fn execute_create_table(&mut self, command: &str) -> Result<()> {
        let request = ddl::parse_create_table(&self.variables.substitute(command))?;
        debug!(?request, "create table request");
        let description = self.storage.create_table(&request)?;
        self.report_description(&description);
        self.history.push(command);
        Ok(())
    }

    fn execute_drop_table(&mut self, command: &str) -> Result<()> {
        let drop = ddl::parse_drop_table(&self.variables.substitute(command))?;
        match self.storage.delete_table(&drop.table_name, drop.if_exists)? {
            Some(description) => self.report_description(&description),
            None => debug!(table = %drop.table_name, "table did not exist"),
        }
        self.history.push(command);
        Ok(())
    }

    fn execute_show_tables(&mut self, command: &str) -> Result<()> {
        ddl::parse_show_tables(&self.variables.substitute(command))?;

        let mut cursor: Option<String> = None;
        loop {
            let page = self.storage.list_tables(cursor.as_deref())?;
            for name in &page.names {
                self.reporter.message(name);
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        self.history.push(command);
        Ok(())
    }

    fn execute_truncate_table(&mut self, command: &str) -> Result<()> {
        let truncate = ddl::parse_truncate_table(&self.variables.substitute(command))?;
        let table = truncate.table_name;
        let description = self.storage.describe(&table)?;

        let mut deleted = 0usize;
        loop {
            let page = self.storage.scan_table(&table)?;
            if page.items.is_empty() {
                break;
            }
            for item in &page.items {
                let key = extract_key(&table, &description.key_schema, item)?;
                self.storage.delete_item(&table, &key)?;
                deleted += 1;
            }
            self.reporter
                .message(&format!("  ... {} items deleted from [{}]", deleted, table));
            if page.last_evaluated_key.is_none() {
                break;
            }
        }

        self.reporter.message(&format!("deleted {} items", deleted));
        self.history.push(command);
        Ok(())
    }

    fn report_description(&mut self, description: &TableDescription) {
        match serde_json::to_value(description) {
            Ok(document) => self.reporter.document(&document),
            Err(e) => warn!(error = %e, "could not render table description"),
        }
    }
}

/// Case-sensitive match on the lower- or upper-case spelling of a keyword.
fn starts_with_keyword(command: &str, lower: &str) -> bool {
    command.starts_with(lower) || command.starts_with(&lower.to_uppercase())
}
