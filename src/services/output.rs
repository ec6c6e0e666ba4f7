use std::io::Write;
use std::sync::Mutex;

use crate::error::OutputError;
use crate::models::TopThree;

/// `<url>,#rrggbb[,#rrggbb[,#rrggbb]]`, one field per ranked color, no empty fields.
pub fn format_row(url: &str, top: &TopThree) -> String {
    let mut row = String::with_capacity(url.len() + 8 * TopThree::SLOTS);
    row.push_str(url);
    for color in top.colors() {
        row.push(',');
        row.push_str(&color.to_string());
    }
    row
}

/// Destination for result rows. Rows arrive in completion order.
pub trait RowSink: Send + Sync {
    fn write_row(&self, row: &str) -> Result<(), OutputError>;
}

/// Writes rows to standard output, one line each, flushed immediately.
#[derive(Default)]
pub struct StdoutSink;

impl RowSink for StdoutSink {
    fn write_row(&self, row: &str) -> Result<(), OutputError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{row}")?;
        out.flush()?;
        Ok(())
    }
}

/// Keeps rows in memory, for embedding and tests.
#[derive(Default)]
pub struct MemorySink {
    rows: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<String> {
        match self.rows.lock() {
            Ok(rows) => rows.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl RowSink for MemorySink {
    fn write_row(&self, row: &str) -> Result<(), OutputError> {
        let mut rows = match self.rows.lock() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        };
        rows.push(row.to_string());
        Ok(())
    }
}
