//! Append-only CSV persistence with checkpoint recovery.
//!
//! The CSV is the pipeline's only durable state. Each postcode's batch is
//! appended as soon as it is complete, so a crash loses at most the batch in
//! flight, and the `Searched Postcode` column doubles as the checkpoint a
//! later run resumes from.
//!
//! Files are written with a UTF-8 BOM so spreadsheet tools pick the right
//! encoding; the BOM and the header row appear exactly once however many
//! batches are appended.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::record::{CSV_HEADERS, ClinicRecord};
use crate::error::StoreError;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

const NAME_COLUMN: &str = CSV_HEADERS[0];
const EMAIL_COLUMN: &str = CSV_HEADERS[5];
const POSTCODE_COLUMN: &str = CSV_HEADERS[6];

/// Handle on the destination CSV. Creation does no IO.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Postcodes already present in the file.
    ///
    /// This never fails the run: a missing file means a first run, an empty
    /// or unreadable one is reported and treated as a fresh start.
    pub fn processed_postcodes(&self) -> HashSet<u32> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashSet::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read existing CSV, starting from scratch");
                return HashSet::new();
            }
        };
        let data = strip_bom(&raw);
        if data.is_empty() {
            tracing::info!("Existing CSV is empty, starting from the beginning");
            return HashSet::new();
        }
        match checkpoint_from(data) {
            Ok(postcodes) => postcodes,
            Err(e) => {
                tracing::warn!(error = %e, "Could not parse existing CSV, starting from scratch");
                HashSet::new()
            }
        }
    }

    /// Appends a batch of records, writing the BOM and header only when the
    /// file is new or empty.
    pub fn append(&self, records: &[ClinicRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let fresh = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if fresh {
            file.write_all(UTF8_BOM)?;
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(fresh)
            .from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads every record back, for the workbook export.
    pub fn load_all(&self) -> Result<Vec<ClinicRecord>, StoreError> {
        let raw = std::fs::read(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound {
                path: self.path.clone(),
            },
            _ => StoreError::Io(e),
        })?;
        let mut reader = csv::Reader::from_reader(strip_bom(&raw));
        let mut records = Vec::new();
        for record in reader.deserialize() {
            records.push(record?);
        }
        Ok(records)
    }
}

/// Name and e-mail cell of one CSV row, as the dispatch pipeline sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub name: String,
    pub email: String,
}

/// Reads the columns the dispatch pipeline needs.
///
/// Unlike the harvest side this is strict: a missing file or a header
/// without `Name` and `Email` is an error, because there is nothing
/// sensible to send without them.
pub fn read_contact_rows(path: &Path) -> Result<Vec<ContactRow>, StoreError> {
    let raw = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StoreError::NotFound {
            path: path.to_path_buf(),
        },
        _ => StoreError::Io(e),
    })?;
    let mut reader = csv::Reader::from_reader(strip_bom(&raw));
    let headers = reader.headers()?.clone();
    let name = headers
        .iter()
        .position(|h| h == NAME_COLUMN)
        .ok_or(StoreError::MissingColumn(NAME_COLUMN))?;
    let email = headers
        .iter()
        .position(|h| h == EMAIL_COLUMN)
        .ok_or(StoreError::MissingColumn(EMAIL_COLUMN))?;
    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        rows.push(ContactRow {
            name: row.get(name).unwrap_or_default().to_string(),
            email: row.get(email).unwrap_or_default().to_string(),
        });
    }
    Ok(rows)
}

fn strip_bom(raw: &[u8]) -> &[u8] {
    raw.strip_prefix(UTF8_BOM).unwrap_or(raw)
}

fn checkpoint_from(data: &[u8]) -> Result<HashSet<u32>, csv::Error> {
    let mut reader = csv::Reader::from_reader(data);
    let headers = reader.headers()?.clone();
    let Some(column) = headers.iter().position(|h| h == POSTCODE_COLUMN) else {
        return Ok(HashSet::new());
    };
    let mut postcodes = HashSet::new();
    for row in reader.records() {
        let row = row?;
        if let Some(cell) = row.get(column)
            && let Ok(postcode) = cell.trim().parse()
        {
            postcodes.insert(postcode);
        }
    }
    Ok(postcodes)
}

// ── Tests ──────────────────────────────────────────────────────────────────
