//! Output side of the shell.

use crate::types::Item;

/// Receives everything the engine wants to show the user.
pub trait Reporter {
    /// Regular output line
    fn message(&mut self, text: &str);

    /// Non-fatal diagnostic
    fn warning(&mut self, text: &str);

    /// Failed command diagnostic
    fn error(&mut self, text: &str);

    /// Rows returned by a query
    fn items(&mut self, items: &[Item]);

    /// Structured document such as a table description or a pagination key
    fn document(&mut self, document: &serde_json::Value);

    /// Clear the display
    fn clear(&mut self);
}
