// src/process/mod.rs
pub mod columns;
pub mod date_parser;
pub mod filter;
pub mod output;
pub mod utils;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::info;

use columns::resolve_columns;
use filter::{FilterStats, RowFilter};
use output::write_csv;

/// Conditions callers need to tell apart. They travel inside `anyhow::Error`
/// and can be recovered with `downcast_ref`.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("missing 'Status'/'OrderDate' columns (case-insensitive variants accepted); headers={headers:?}")]
    MissingColumns { headers: Vec<String> },

    #[error("unrecognized date format: {0:?}")]
    UnparseableDate(String),

    #[error("object is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Result of running the retention filter over one object's bytes.
#[derive(Debug)]
pub enum TransformOutcome {
    /// The object had zero bytes; nothing should be written.
    Empty,
    Filtered {
        /// Kept rows as UTF-8 CSV, original header first.
        csv: Vec<u8>,
        stats: FilterStats,
    },
}

/// Decode, parse, filter and re-serialize one CSV object.
///
/// Only a zero-byte object is empty. Blank-line or BOM-only bodies have no
/// usable header and fail like any other file missing its columns.
///
/// Fatal: invalid UTF-8, missing status/date columns, unreadable CSV.
/// Rows with bad dates are only counted.
pub fn transform_csv(data: &[u8], filter: &RowFilter) -> Result<TransformOutcome> {
    if data.is_empty() {
        return Ok(TransformOutcome::Empty);
    }
    let text = std::str::from_utf8(data).map_err(ProcessError::from)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let columns = resolve_columns(&headers)?;
    info!(
        status = %columns.status.name,
        date = %columns.date.name,
        cutoff = %filter.cutoff().date(),
        "using columns"
    );

    let rows: Vec<StringRecord> = rdr
        .records()
        .enumerate()
        .map(|(i, r)| r.with_context(|| format!("CSV parse error at record {}", i + 1)))
        .collect::<Result<_>>()?;

    let (kept, stats) = filter.filter_rows(rows, &columns);
    info!(
        total = stats.total,
        kept = stats.kept,
        filtered_out = stats.filtered_out,
        bad_dates = stats.bad_dates,
        "processed rows"
    );

    let csv = write_csv(&headers, &kept)?;
    Ok(TransformOutcome::Filtered { csv, stats })
}
