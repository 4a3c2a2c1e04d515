// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact list loading for `courier bulk`.
//!
//! Accepts a CSV file with a `phone`, `phone_number` or `number` column, or
//! a headerless file whose first column holds the numbers.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use courier_core::{CourierError, phone};

const PHONE_COLUMNS: &[&str] = &["phone", "phone_number", "number"];

/// Reads the contact numbers in file order. Blank cells are skipped; other
/// values are passed through unvalidated so each bad row is reported per contact.
pub fn read_contacts(path: &Path) -> Result<Vec<String>, CourierError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let mut records = reader.records();
    let Some(first) = records.next().transpose().map_err(csv_error)? else {
        return Ok(Vec::new());
    };

    let (column, mut contacts) = match header_column(&first) {
        Some(column) => (column, Vec::new()),
        None => (0, cell(&first, 0).into_iter().collect()),
    };
    for record in records {
        let record = record.map_err(csv_error)?;
        contacts.extend(cell(&record, column));
    }
    Ok(contacts)
}

fn header_column(record: &StringRecord) -> Option<usize> {
    let named = record
        .iter()
        .position(|field| PHONE_COLUMNS.contains(&field.to_ascii_lowercase().as_str()));
    if named.is_some() {
        return named;
    }
    // A first row that is not a phone number is some other header.
    match record.get(0) {
        Some(first) if phone::normalize(first).is_err() && !first.is_empty() => Some(0),
        _ => None,
    }
}

fn cell(record: &StringRecord, column: usize) -> Option<String> {
    record
        .get(column)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn csv_error(e: csv::Error) -> CourierError {
    CourierError::Internal(format!("cannot read contacts: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn named_phone_column_is_used() {
        let f = file("name,Phone\nDana,+15551111111\nLee,\nKim, +15552222222\n");
        assert_eq!(
            read_contacts(f.path()).unwrap(),
            vec!["+15551111111", "+15552222222"]
        );
    }

    #[test]
    fn headerless_file_uses_first_column() {
        let f = file("+15551111111,Dana\n15552222222\n");
        assert_eq!(
            read_contacts(f.path()).unwrap(),
            vec!["+15551111111", "15552222222"]
        );
    }

    #[test]
    fn unknown_header_is_skipped() {
        let f = file("contact\n+15551111111\nnot-a-number\n");
        assert_eq!(
            read_contacts(f.path()).unwrap(),
            vec!["+15551111111", "not-a-number"]
        );
    }

    #[test]
    fn empty_file_has_no_contacts() {
        let f = file("");
        assert!(read_contacts(f.path()).unwrap().is_empty());
    }
}
