pub mod error;
pub mod types;
pub mod lex;
pub mod complement;
pub mod ddl;
pub mod storage;
pub mod config;
pub mod variables;
pub mod history;
pub mod script;
pub mod builtin;
pub mod reporter;
pub mod session;

pub use error::{CommandKind, Error, ErrorCategory, Result};
pub use types::*;
pub use complement::{complement, Complement};
pub use config::{ConnectionArgs, ConnectionConfig, ShellConfig, StaticCredentials};
pub use reporter::Reporter;
pub use session::{Flow, Line, Prompt, Session, CONTINUATION_PROMPT, PROMPT};
pub use storage::{Connector, StorageAccess};
