//! Persistence layer — the append-only CSV plus the XLSX export.

pub mod csv;
pub mod excel;
pub mod record;

pub use self::csv::{ContactRow, CsvStore, read_contact_rows};
pub use self::excel::export_workbook;
pub use self::record::{CSV_HEADERS, ClinicRecord, NOT_FOUND, RATING_SENTINEL};
