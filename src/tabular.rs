// src/tabular.rs
//
// Tabular decoder: turns an uploaded file (CSV or Excel) or pasted text into
// a header row plus string-keyed records. The decoded table is ephemeral and
// only lives for the duration of one import session.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use calamine::{Data, Reader};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unsupported file type. Please upload a CSV or Excel file.")]
    UnsupportedType,

    #[error("File must contain at least a header row and one data row.")]
    NotEnoughRows,

    #[error("Upload contained neither a file nor pasted text.")]
    EmptyUpload,

    #[error("Failed to read CSV data: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("File content is not valid base64: {0}")]
    Content(#[from] base64::DecodeError),
}

/// One data row keyed by the header of each populated cell. Unknown columns
/// are simply carried along and ignored by the normalizers.
#[derive(Debug, Clone, Default)]
pub struct RawRecord(HashMap<String, String>);

impl RawRecord {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.0.get(header).map(String::as_str)
    }

    fn insert(&mut self, header: &str, value: String) {
        if !value.is_empty() {
            self.0.insert(header.to_string(), value);
        }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut record = Self::default();
        for (header, value) in pairs {
            record.insert(header, value.to_string());
        }
        record
    }
}

/// Headers in file order plus all data rows of one upload.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRecord>,
}

/// What the import endpoints accept: either pasted CSV text, or a named file
/// whose content travels base64-encoded inside the JSON body.
#[derive(Debug, Clone, Deserialize)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_base64: Option<String>,
    pub text: Option<String>,
}

/// Decodes an upload into a `RawTable`, picking the decoder from the file
/// extension. Pasted text is always treated as CSV.
pub fn decode_upload(upload: &Upload) -> Result<RawTable, DecodeError> {
    if let Some(text) = upload.text.as_deref().filter(|t| !t.trim().is_empty()) {
        return decode_csv(text.as_bytes());
    }

    let (file_name, content) = match (&upload.file_name, &upload.content_base64) {
        (Some(name), Some(content)) => (name, content),
        _ => return Err(DecodeError::EmptyUpload),
    };
    let bytes = BASE64_STANDARD.decode(content)?;

    let extension = file_name
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => decode_csv(&bytes),
        "xlsx" | "xls" => decode_spreadsheet(&bytes),
        _ => Err(DecodeError::UnsupportedType),
    }
}

fn decode_csv(bytes: &[u8]) -> Result<RawTable, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        records.push(record.iter().map(str::to_string).collect());
    }

    build_table(records)
}

fn decode_spreadsheet(bytes: &[u8]) -> Result<RawTable, DecodeError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| DecodeError::Spreadsheet(e.to_string()))?;

    // First sheet only.
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DecodeError::Spreadsheet("workbook has no sheets".to_string()))?
        .map_err(|e| DecodeError::Spreadsheet(e.to_string()))?;

    let mut records: Vec<Vec<String>> = Vec::new();
    for row in range.rows() {
        let cells: Vec<String> = row.iter().map(cell_to_string).collect();
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        records.push(cells);
    }

    build_table(records)
}

fn build_table(records: Vec<Vec<String>>) -> Result<RawTable, DecodeError> {
    if records.len() < 2 {
        return Err(DecodeError::NotEnoughRows);
    }

    let mut records = records.into_iter();
    let headers: Vec<String> = match records.next() {
        Some(cells) => cells.iter().map(|h| h.trim().to_string()).collect(),
        None => return Err(DecodeError::NotEnoughRows),
    };

    let rows: Vec<RawRecord> = records
        .map(|cells| {
            let mut row = RawRecord::default();
            for (header, cell) in headers.iter().zip(cells) {
                row.insert(header, cell);
            }
            row
        })
        .collect();

    debug!("Decoded table: {} columns, {} rows", headers.len(), rows.len());
    Ok(RawTable { headers, rows })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // Integral floats render without a trailing ".0" so that durations
        // and bare hours survive the spreadsheet round-trip.
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}
