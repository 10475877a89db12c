/// Terminal reporter: results to stdout, diagnostics to stderr

use clap::ValueEnum;
use colored::Colorize;
use ddbql_core::{item_to_json, Item, Reporter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON document per item (default)
    Json,
    /// Bordered table
    Table,
}

pub struct ConsoleReporter {
    format: OutputFormat,
}

impl ConsoleReporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

/// Render items for display in the given format.
pub fn render_items(format: OutputFormat, items: &[Item]) -> String {
    match format {
        OutputFormat::Table => crate::table::format_items_table(items),
        OutputFormat::Json => items
            .iter()
            .map(|item| item_to_json(item).to_string())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

impl Reporter for ConsoleReporter {
    fn message(&mut self, text: &str) {
        println!("{}", text);
    }

    fn warning(&mut self, text: &str) {
        eprintln!("{} {}", "warning:".yellow().bold(), text);
    }

    fn error(&mut self, text: &str) {
        eprintln!("{} {}", "error:".red().bold(), text);
    }

    fn items(&mut self, items: &[Item]) {
        if items.is_empty() && self.format == OutputFormat::Json {
            return;
        }
        println!("{}", render_items(self.format, items));
    }

    fn document(&mut self, document: &serde_json::Value) {
        match serde_json::to_string_pretty(document) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", document),
        }
    }

    fn clear(&mut self) {
        print!("\x1B[2J\x1B[1;1H");
    }
}
