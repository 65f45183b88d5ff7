//! XLSX export of the harvested records.

use std::path::Path;

use rust_xlsxwriter::Workbook;

use super::record::{CSV_HEADERS, ClinicRecord, RATING_SENTINEL};
use crate::error::StoreError;

/// Writes the records to a single-sheet workbook mirroring the CSV layout:
/// a header row, then one row per record, ratings as real numbers where
/// present.
pub fn export_workbook(records: &[ClinicRecord], path: &Path) -> Result<(), StoreError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, header) in CSV_HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    for (index, record) in records.iter().enumerate() {
        let row = (index + 1) as u32;
        sheet.write_string(row, 0, &record.name)?;
        sheet.write_string(row, 1, &record.address)?;
        sheet.write_string(row, 2, &record.phone)?;
        sheet.write_string(row, 3, &record.website)?;
        match record.rating {
            Some(rating) => sheet.write_number(row, 4, f64::from(rating))?,
            None => sheet.write_string(row, 4, RATING_SENTINEL)?,
        };
        sheet.write_string(row, 5, &record.email)?;
        sheet.write_number(row, 6, f64::from(record.postcode))?;
    }

    workbook.save(path)?;
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────
