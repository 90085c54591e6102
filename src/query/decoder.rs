//! CSV result decoding.
//!
//! Turns a downloaded result file into a [`RecordSet`]: one string-to-string
//! map per data row, keyed by the header row. Values are never type-converted.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::error::{Result, SigmaError};

/// One decoded row, mapping column name to cell text.
pub type Record = BTreeMap<String, String>;

/// Decoded result rows, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    /// Distinct header names in first-seen order.
    columns: Vec<String>,
    records: Vec<Record>,
}

impl RecordSet {
    /// Returns the distinct column names in header order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Iterates rows as views that serialize their fields in header order.
    pub fn ordered(&self) -> impl Iterator<Item = OrderedRecord<'_>> {
        self.records.iter().map(move |record| OrderedRecord {
            columns: &self.columns,
            record,
        })
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl IntoIterator for RecordSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Serializes as a plain array of objects, keys in header order.
impl Serialize for RecordSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.records.len()))?;
        for record in self.ordered() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}

/// A borrowed row that serializes its fields in header order.
#[derive(Debug, Clone, Copy)]
pub struct OrderedRecord<'a> {
    columns: &'a [String],
    record: &'a Record,
}

impl<'a> OrderedRecord<'a> {
    /// Returns `(column, value)` pairs in header order.
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let (columns, record) = (self.columns, self.record);
        columns.iter().filter_map(move |name| {
            record
                .get(name)
                .map(|value| (name.as_str(), value.as_str()))
        })
    }
}

impl Serialize for OrderedRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.record.len()))?;
        for (name, value) in self.fields() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Decodes a CSV payload with a header row into records.
///
/// An empty or whitespace-only payload, or one with only a header, gives an
/// empty set. A row with a different field count than the header fails the
/// whole decode. With a single column, a blank line is a row whose value is
/// the empty string.
pub fn decode_records(payload: &[u8]) -> Result<RecordSet> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(RecordSet::default());
    }

    let header_width = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(payload)
        .headers()
        .map_err(decode_error)?
        .len();

    // The csv reader skips empty lines, which would drop NULL cells of a
    // one-column result.
    let payload: Cow<'_, [u8]> = if header_width == 1 {
        Cow::Owned(quote_blank_lines(payload))
    } else {
        Cow::Borrowed(payload)
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(payload.as_ref());

    let headers = reader.headers().map_err(decode_error)?.clone();

    let mut columns: Vec<String> = Vec::with_capacity(headers.len());
    for name in headers.iter() {
        if !columns.iter().any(|c| c == name) {
            columns.push(name.to_string());
        }
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(decode_error)?;
        // Duplicate header names: the later column wins.
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        records.push(record);
    }

    Ok(RecordSet { columns, records })
}

/// Replaces every empty line after the header with an empty quoted field.
///
/// Line breaks inside quoted fields are left alone.
fn quote_blank_lines(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 16);
    let mut in_quotes = false;
    let mut line_start = true;
    let mut past_header = false;

    for (i, &b) in payload.iter().enumerate() {
        let terminator = b == b'\n' || (b == b'\r' && payload.get(i + 1) == Some(&b'\n'));
        if line_start && past_header && !in_quotes && terminator {
            out.extend_from_slice(b"\"\"");
            line_start = false;
        }
        out.push(b);

        match b {
            b'"' => in_quotes = !in_quotes,
            b'\n' if !in_quotes => {
                if !line_start {
                    past_header = true;
                }
                line_start = true;
                continue;
            }
            b'\r' if !in_quotes => continue,
            _ => {}
        }
        line_start = false;
    }

    out
}

fn decode_error(e: csv::Error) -> SigmaError {
    SigmaError::protocol(format!("Failed to decode result file: {}", e))
}
