use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which command a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Select,
    Insert,
    Update,
    Delete,
    CreateTable,
    DropTable,
    Desc,
    ShowTables,
    TruncateTable,
    Variable,
    Sleep,
    Connect,
    LoadScript,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Select => "select",
            CommandKind::Insert => "insert",
            CommandKind::Update => "update",
            CommandKind::Delete => "delete",
            CommandKind::CreateTable => "create table",
            CommandKind::DropTable => "drop table",
            CommandKind::Desc => "desc",
            CommandKind::ShowTables => "show tables",
            CommandKind::TruncateTable => "truncate table",
            CommandKind::Variable => "variable",
            CommandKind::Sleep => "sleep",
            CommandKind::Connect => "connect",
            CommandKind::LoadScript => "load script",
        };
        f.write_str(name)
    }
}

/// Error taxonomy used to decide how far a failure propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or malformed keyword, delimiter or value
    Structural,
    /// Well-formed but illegal value (attribute type, key role, integer argument,
    /// script path)
    Semantic,
    /// Failure reported by the storage-access layer
    Collaborator,
    /// Failure outside a single statement (configuration, I/O)
    Fatal,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} syntax error: {reason} [{command}]")]
    Syntax {
        kind: CommandKind,
        command: String,
        reason: String,
    },

    #[error("{kind} error: {reason} [{command}]")]
    Validation {
        kind: CommandKind,
        command: String,
        reason: String,
    },

    #[error("unsupported statement [{0}]")]
    UnsupportedStatement(String),

    #[error("table [{0}] not found")]
    TableNotFound(String),

    #[error("{operation} failed: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },

    #[error("error load script (not found {})", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("connect argument error: {0}")]
    ConnectArguments(String),

    #[error("no statement in history to run")]
    NoHistory,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn syntax(kind: CommandKind, command: &str, reason: impl Into<String>) -> Self {
        Error::Syntax {
            kind,
            command: command.trim().to_string(),
            reason: reason.into(),
        }
    }

    pub fn validation(kind: CommandKind, command: &str, reason: impl Into<String>) -> Self {
        Error::Validation {
            kind,
            command: command.trim().to_string(),
            reason: reason.into(),
        }
    }

    pub fn storage(operation: &'static str, message: impl fmt::Display) -> Self {
        Error::Storage {
            operation,
            message: message.to_string(),
        }
    }

    /// Returns a stable error code for this error variant.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Syntax { .. } => "SYNTAX_ERROR",
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::UnsupportedStatement(_) => "UNSUPPORTED_STATEMENT",
            Error::TableNotFound(_) => "TABLE_NOT_FOUND",
            Error::Storage { .. } => "STORAGE_ERROR",
            Error::ScriptNotFound(_) => "SCRIPT_NOT_FOUND",
            Error::ConnectArguments(_) => "CONNECT_ARGUMENTS",
            Error::NoHistory => "NO_HISTORY",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Io(_) => "IO_ERROR",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Syntax { .. } | Error::UnsupportedStatement(_) | Error::NoHistory => {
                ErrorCategory::Structural
            }
            Error::Validation { .. } | Error::ConnectArguments(_) | Error::ScriptNotFound(_) => {
                ErrorCategory::Semantic
            }
            Error::TableNotFound(_) | Error::Storage { .. } => ErrorCategory::Collaborator,
            Error::InvalidConfig(_) | Error::Io(_) => ErrorCategory::Fatal,
        }
    }

    /// The offending command text, when the error carries one.
    pub fn command(&self) -> Option<&str> {
        match self {
            Error::Syntax { command, .. } | Error::Validation { command, .. } => Some(command),
            Error::UnsupportedStatement(command) => Some(command),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
