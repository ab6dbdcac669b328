use crate::domain::model::FlatRow;
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use csv::{Terminator, WriterBuilder};
use serde_json::Value;
use std::collections::HashSet;

/// Union of all row keys, in the order each key is first seen.
pub fn column_order(rows: &[FlatRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for key in rows.iter().flat_map(|row| row.keys()) {
        if seen.insert(key.as_str()) {
            columns.push(key.clone());
        }
    }
    columns
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Serializes `rows` as CSV: a header line, then one line per row with blanks
/// for the columns that row does not have. No columns means a lone empty
/// header line.
pub fn rows_to_csv(rows: &[FlatRow]) -> Result<Vec<u8>> {
    let columns = column_order(rows);
    if columns.is_empty() {
        return Ok(b"\r\n".to_vec());
    }

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(&columns)?;
    for row in rows {
        writer.write_record(
            columns
                .iter()
                .map(|column| row.get(column).map(cell_text).unwrap_or_default()),
        )?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

/// Turns a fully buffered endpoint into one CSV object in storage.
pub struct CsvUploader<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> CsvUploader<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Writes `rows` to `key`, replacing any existing object, and returns the row count.
    pub async fn upload(&self, rows: &[FlatRow], key: &str) -> Result<usize> {
        let payload = rows_to_csv(rows)?;
        tracing::debug!("Writing {} bytes of CSV to {}", payload.len(), key);
        self.storage.write_file(key, &payload).await?;
        tracing::info!("Uploaded {} rows to {}", rows.len(), key);
        Ok(rows.len())
    }
}
