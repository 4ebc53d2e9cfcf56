use crate::domain::model::{Table, TableKind};
use crate::utils::error::{EtlError, Result};
use std::collections::HashMap;

/// Maps a file header onto its canonical field name.
pub fn canonical_field(header: &str, aliases: &HashMap<String, String>) -> String {
    aliases
        .get(header)
        .or_else(|| aliases.get(header.trim()))
        .cloned()
        .unwrap_or_else(|| header.trim().to_string())
}

// 非 UTF-8 位元組以 U+FFFD 取代，整列保留
fn decode_cell(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

pub fn read_table(data: &[u8], kind: TableKind, aliases: &HashMap<String, String>) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader.byte_headers()?.iter().map(decode_cell).collect();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(EtlError::ProcessingError {
            message: format!("{} file has no header row", kind),
        });
    }
    let fields = headers
        .iter()
        .map(|h| canonical_field(h, aliases))
        .collect();

    let mut rows = Vec::new();
    let mut skipped_rows = 0;
    let mut lossy_rows = 0;
    for record in reader.byte_records() {
        let record = record?;
        if record.len() != headers.len() {
            skipped_rows += 1;
            continue;
        }
        if std::str::from_utf8(record.as_slice()).is_err() {
            lossy_rows += 1;
        }
        rows.push(record.iter().map(decode_cell).collect());
    }

    if lossy_rows > 0 {
        tracing::warn!(
            "⚠️ {} {} row(s) were not valid UTF-8; bad bytes replaced with U+FFFD",
            lossy_rows,
            kind
        );
    }

    if skipped_rows > 0 {
        tracing::warn!(
            "⚠️ Skipped {} {} row(s) whose cell count did not match the header",
            skipped_rows,
            kind
        );
    }
    tracing::debug!("Loaded {} {} rows, {} columns", rows.len(), kind, headers.len());

    Ok(Table {
        kind,
        headers,
        fields,
        rows,
        skipped_rows,
    })
}

pub fn write_table(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}
