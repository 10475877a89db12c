/// Test utilities for driving a ddbql session without a live service
///
/// `MemoryStorage` stands in for the storage service, `CapturedReporter`
/// records everything the session prints and `ScriptedPrompt` feeds
/// interactive input from a fixed list.

use ddbql_core::storage::{
    extract_key, CreateTableRequest, ExecuteOutput, ScanPage, StorageAccess, TableDescription,
    TablePage, SCAN_PAGE_SIZE,
};
use ddbql_core::{
    ConnectionConfig, Error, Item, Line, Prompt, Reporter, Result, Session, ShellConfig,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// Table names returned per `list_tables` call unless overridden
pub const DEFAULT_LIST_PAGE_SIZE: usize = 2;

/// Arguments of one `execute` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteCall {
    pub statement: String,
    pub limit: Option<i32>,
    pub next_token: Option<String>,
}

struct MemoryTable {
    description: TableDescription,
    items: Vec<Item>,
}

struct MemoryState {
    tables: BTreeMap<String, MemoryTable>,
    execute_pages: VecDeque<Result<ExecuteOutput>>,
    executed: Vec<ExecuteCall>,
    connections: Vec<ConnectionConfig>,
    list_page_size: usize,
}

/// In-memory storage double shared between the test and the session
#[derive(Clone)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                tables: BTreeMap::new(),
                execute_pages: VecDeque::new(),
                executed: Vec::new(),
                connections: Vec::new(),
                list_page_size: DEFAULT_LIST_PAGE_SIZE,
            })),
        }
    }

    pub fn with_list_page_size(self, size: usize) -> Self {
        self.state.lock().list_page_size = size.max(1);
        self
    }

    /// Queue the result of the next `execute` call.
    pub fn push_execute_page(&self, output: ExecuteOutput) {
        self.state.lock().execute_pages.push_back(Ok(output));
    }

    /// Queue a failure for the next `execute` call.
    pub fn push_execute_error(&self, error: Error) {
        self.state.lock().execute_pages.push_back(Err(error));
    }

    pub fn executed(&self) -> Vec<ExecuteCall> {
        self.state.lock().executed.clone()
    }

    /// Configurations passed to [`MemoryStorage::connector`], in order.
    pub fn connections(&self) -> Vec<ConnectionConfig> {
        self.state.lock().connections.clone()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.state.lock().tables.keys().cloned().collect()
    }

    pub fn items(&self, table_name: &str) -> Vec<Item> {
        self.state
            .lock()
            .tables
            .get(table_name)
            .map(|table| table.items.clone())
            .unwrap_or_default()
    }

    /// Create a table directly, bypassing the session.
    pub fn create(&self, request: &CreateTableRequest) {
        let _ = StorageAccess::create_table(self, request);
    }

    pub fn put_item(&self, table_name: &str, item: Item) {
        if let Some(table) = self.state.lock().tables.get_mut(table_name) {
            table.items.push(item);
        }
    }

    /// A connector that records each configuration and hands out this storage.
    pub fn connector(&self) -> impl Fn(&ConnectionConfig) -> Result<Box<dyn StorageAccess>> {
        let storage = self.clone();
        move |config: &ConnectionConfig| {
            storage.state.lock().connections.push(config.clone());
            Ok(Box::new(storage.clone()) as Box<dyn StorageAccess>)
        }
    }
}

impl StorageAccess for MemoryStorage {
    fn execute(
        &self,
        statement: &str,
        limit: Option<i32>,
        next_token: Option<&str>,
    ) -> Result<ExecuteOutput> {
        let mut state = self.state.lock();
        state.executed.push(ExecuteCall {
            statement: statement.to_string(),
            limit,
            next_token: next_token.map(str::to_string),
        });
        state
            .execute_pages
            .pop_front()
            .unwrap_or_else(|| Ok(ExecuteOutput::default()))
    }

    fn describe(&self, table_name: &str) -> Result<TableDescription> {
        self.state
            .lock()
            .tables
            .get(table_name)
            .map(|table| table.description.clone())
            .ok_or_else(|| Error::TableNotFound(table_name.to_string()))
    }

    fn create_table(&self, request: &CreateTableRequest) -> Result<TableDescription> {
        let mut state = self.state.lock();
        if state.tables.contains_key(&request.table_name) {
            return Err(Error::storage(
                "create table",
                format!("table [{}] already exists", request.table_name),
            ));
        }

        let description = TableDescription {
            table_name: request.table_name.clone(),
            table_status: Some("ACTIVE".to_string()),
            table_arn: None,
            key_schema: request.key_schema(),
            attribute_definitions: request
                .all_attributes()
                .iter()
                .map(|a| (a.name.clone(), a.attribute_type.as_str().to_string()))
                .collect(),
            item_count: Some(0),
            local_secondary_indexes: request
                .indexes
                .iter()
                .filter(|i| i.scope == ddbql_core::storage::IndexScope::Local)
                .map(|i| i.name.clone())
                .collect(),
            global_secondary_indexes: request
                .indexes
                .iter()
                .filter(|i| i.scope == ddbql_core::storage::IndexScope::Global)
                .map(|i| i.name.clone())
                .collect(),
        };

        state.tables.insert(
            request.table_name.clone(),
            MemoryTable {
                description: description.clone(),
                items: Vec::new(),
            },
        );
        Ok(description)
    }

    fn delete_table(
        &self,
        table_name: &str,
        ignore_not_found: bool,
    ) -> Result<Option<TableDescription>> {
        match self.state.lock().tables.remove(table_name) {
            Some(table) => Ok(Some(TableDescription {
                table_status: Some("DELETING".to_string()),
                ..table.description
            })),
            None if ignore_not_found => Ok(None),
            None => Err(Error::TableNotFound(table_name.to_string())),
        }
    }

    fn list_tables(&self, start_after: Option<&str>) -> Result<TablePage> {
        let state = self.state.lock();
        let remaining: Vec<&String> = state
            .tables
            .keys()
            .filter(|name| start_after.map_or(true, |start| name.as_str() > start))
            .collect();

        let names: Vec<String> = remaining
            .iter()
            .take(state.list_page_size)
            .map(|name| name.to_string())
            .collect();
        let next_cursor = if remaining.len() > names.len() {
            names.last().cloned()
        } else {
            None
        };
        Ok(TablePage { names, next_cursor })
    }

    fn scan_table(&self, table_name: &str) -> Result<ScanPage> {
        let state = self.state.lock();
        let table = state
            .tables
            .get(table_name)
            .ok_or_else(|| Error::TableNotFound(table_name.to_string()))?;

        let page_size = SCAN_PAGE_SIZE as usize;
        let items: Vec<Item> = table.items.iter().take(page_size).cloned().collect();
        let last_evaluated_key = if table.items.len() > page_size {
            match items.last() {
                Some(last) => Some(extract_key(
                    table_name,
                    &table.description.key_schema,
                    last,
                )?),
                None => None,
            }
        } else {
            None
        };
        Ok(ScanPage {
            items,
            last_evaluated_key,
        })
    }

    fn delete_item(&self, table_name: &str, key: &Item) -> Result<()> {
        let mut state = self.state.lock();
        let table = state
            .tables
            .get_mut(table_name)
            .ok_or_else(|| Error::TableNotFound(table_name.to_string()))?;
        table
            .items
            .retain(|item| !key.iter().all(|(name, value)| item.get(name) == Some(value)));
        Ok(())
    }
}

/// Everything a session reported, in arrival order per channel
#[derive(Debug, Clone, Default)]
pub struct Captured {
    pub messages: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub items: Vec<Vec<Item>>,
    pub documents: Vec<serde_json::Value>,
    pub clears: usize,
}

/// Reporter that records output for assertions
#[derive(Clone, Default)]
pub struct CapturedReporter {
    captured: Arc<Mutex<Captured>>,
}

impl CapturedReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Captured {
        self.captured.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.captured.lock().messages.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.captured.lock().errors.clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.captured.lock().warnings.clone()
    }
}

impl Reporter for CapturedReporter {
    fn message(&mut self, text: &str) {
        self.captured.lock().messages.push(text.to_string());
    }

    fn warning(&mut self, text: &str) {
        self.captured.lock().warnings.push(text.to_string());
    }

    fn error(&mut self, text: &str) {
        self.captured.lock().errors.push(text.to_string());
    }

    fn items(&mut self, items: &[Item]) {
        self.captured.lock().items.push(items.to_vec());
    }

    fn document(&mut self, document: &serde_json::Value) {
        self.captured.lock().documents.push(document.clone());
    }

    fn clear(&mut self) {
        self.captured.lock().clears += 1;
    }
}

/// Prompt that replays a fixed list of reads, then reports end of input
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    lines: VecDeque<Line>,
    prompts: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(|l| Line::Text(l.into())).collect(),
            prompts: Vec::new(),
        }
    }

    pub fn with_reads(reads: Vec<Line>) -> Self {
        Self {
            lines: reads.into(),
            prompts: Vec::new(),
        }
    }

    /// Prompt strings shown so far
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Prompt for ScriptedPrompt {
    fn read_line(&mut self, prompt: &str) -> Line {
        self.prompts.push(prompt.to_string());
        self.lines.pop_front().unwrap_or(Line::Eof)
    }
}

/// Build a session over `storage` that reports into `reporter`.
pub fn session_with(
    storage: &MemoryStorage,
    reporter: &CapturedReporter,
    config: ShellConfig,
) -> Session {
    Session::new(
        config,
        Box::new(storage.connector()),
        Box::new(reporter.clone()),
    )
    .expect("Failed to start session")
}

/// Build a session with the default configuration.
pub fn session(storage: &MemoryStorage, reporter: &CapturedReporter) -> Session {
    session_with(storage, reporter, ShellConfig::default())
}

/// Build an item from name/value pairs.
pub fn item(pairs: &[(&str, ddbql_core::Value)]) -> Item {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}
