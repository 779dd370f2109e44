//! CSV route import parser.
//!
//! Comma-delimited, header row required. Recognized headers are `id`, `name`,
//! `created` and the optional `protected`, matched case-insensitively in any
//! order. Quoting is not supported, so a cell may not contain a comma.
//! Trailing empty cells past the header width (a trailing comma) are ignored;
//! any other extra cell makes the row malformed.

use chrono::{DateTime, SecondsFormat, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};

use super::error::ParseError;
use super::model::{ImportRow, RouteId};

const REQUIRED_COLUMNS: [&str; 3] = ["id", "name", "created"];

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    id: usize,
    name: usize,
    created: usize,
    protected: Option<usize>,
    width: usize,
}

impl Columns {
    fn from_header(header: &StringRecord) -> Result<Self, ParseError> {
        let names: Vec<String> = header.iter().map(str::to_lowercase).collect();

        let position = |column: &str| names.iter().position(|name| name == column);

        let mut required = [0usize; 3];
        for (slot, column) in required.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = position(column).ok_or_else(|| ParseError::MissingRequiredColumn(column.to_string()))?;
        }

        Ok(Self {
            id: required[0],
            name: required[1],
            created: required[2],
            protected: position("protected"),
            width: names.len(),
        })
    }
}

/// Parse CSV text into import rows, defaulting missing timestamps to now
pub fn parse(text: &str) -> Result<Vec<ImportRow>, ParseError> {
    parse_at(text, Utc::now())
}

/// Parse CSV text using `now` for rows without a `created` value
pub fn parse_at(text: &str, now: DateTime<Utc>) -> Result<Vec<ImportRow>, ParseError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let header = reader.headers().map_err(|e| read_error(e, 1))?.clone();
    if is_blank(&header) {
        return Err(ParseError::EmptyFile);
    }
    let columns = Columns::from_header(&header)?;
    let default_created = now.to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| read_error(e, index + 2))?;
        if is_blank(&record) {
            continue;
        }
        let line = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(index + 2);
        rows.push(parse_row(line, &record, &columns, &default_created)?);
    }

    if rows.is_empty() {
        return Err(ParseError::EmptyFile);
    }

    tracing::debug!("Parsed {} import rows", rows.len());
    Ok(rows)
}

/// A whitespace-only line reads as one empty cell
fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

fn read_error(err: csv::Error, fallback_line: usize) -> ParseError {
    let line = err
        .position()
        .map(|pos| pos.line() as usize)
        .unwrap_or(fallback_line);

    ParseError::MalformedRow {
        line,
        reason: err.to_string(),
    }
}

fn parse_row(
    line: usize,
    record: &StringRecord,
    columns: &Columns,
    default_created: &str,
) -> Result<ImportRow, ParseError> {
    let extra = record.iter().skip(columns.width).any(|cell| !cell.is_empty());
    if extra {
        return Err(ParseError::MalformedRow {
            line,
            reason: format!("expected at most {} fields, found {}", columns.width, record.len()),
        });
    }

    let cell = |index: usize| record.get(index).unwrap_or("");

    let name = cell(columns.name);
    if name.is_empty() {
        return Err(ParseError::MalformedRow {
            line,
            reason: "name is empty".to_string(),
        });
    }

    let (id, id_synthesized) = match cell(columns.id) {
        "" => (RouteId::placeholder(), true),
        id => (RouteId::from(id), false),
    };

    let created = match cell(columns.created) {
        "" => default_created.to_string(),
        created => created.to_string(),
    };

    let protected = columns
        .protected
        .map(|index| cell(index).eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    Ok(ImportRow {
        line,
        id,
        id_synthesized,
        name: name.to_string(),
        created,
        protected,
    })
}
