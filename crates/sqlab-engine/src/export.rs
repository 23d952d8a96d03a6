//! CSV and JSON export of results

use crate::error::EngineError;
use crate::types::{CellValue, QueryOutput, QueryResult, ResultSet};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Header line plus one comma-joined line per row, joined with `\n`
///
/// Fields are written raw: a value containing a comma, quote or newline
/// produces a malformed file. Use [`to_csv_quoted`] when that matters.
#[must_use]
pub fn to_csv(set: &ResultSet) -> String {
    let mut lines = Vec::with_capacity(set.row_count() + 1);
    lines.push(set.columns.join(","));
    for row in &set.rows {
        let fields: Vec<String> = row.iter().map(CellValue::to_field).collect();
        lines.push(fields.join(","));
    }
    lines.join("\n")
}

/// RFC 4180 CSV with the same line layout as [`to_csv`]
///
/// Fields holding a comma, quote, CR or LF are quoted.
///
/// # Errors
/// `Export` if the writer fails.
pub fn to_csv_quoted(set: &ResultSet) -> Result<String, EngineError> {
    let mut writer = quoted_writer(Vec::new());
    write_records(&mut writer, set)?;
    let bytes = writer
        .into_inner()
        .map_err(|err| EngineError::Export(err.into_error()))?;
    let mut body = String::from_utf8(bytes)
        .map_err(|err| EngineError::Export(io::Error::new(io::ErrorKind::InvalidData, err)))?;
    // no terminator after the last record
    if body.ends_with('\n') {
        body.pop();
    }
    Ok(body)
}

fn quoted_writer<W: Write>(sink: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(sink)
}

fn write_records<W: Write>(writer: &mut csv::Writer<W>, set: &ResultSet) -> Result<(), EngineError> {
    writer.write_record(&set.columns).map_err(csv_error)?;
    for row in &set.rows {
        writer
            .write_record(row.iter().map(CellValue::to_field))
            .map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn csv_error(err: csv::Error) -> EngineError {
    EngineError::Export(err.into())
}

/// Write the result set of `result` to `path`
///
/// Quoted files end every record, the last included, with `\n`.
///
/// # Errors
/// `Export` when `result` holds no result set (`InvalidInput`) or the file
/// cannot be written.
pub fn write_csv(result: &QueryResult, path: impl AsRef<Path>, quoted: bool) -> Result<(), EngineError> {
    let path = path.as_ref();
    let set = result.result_set().ok_or_else(|| {
        EngineError::Export(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no result set to export",
        ))
    })?;
    if quoted {
        let mut writer = quoted_writer(File::create(path)?);
        write_records(&mut writer, set)?;
    } else {
        fs::write(path, to_csv(set))?;
    }
    tracing::info!("Exported {} rows to {}", set.row_count(), path.display());
    Ok(())
}

/// JSON view of a result for machine consumers
#[must_use]
pub fn to_json(result: &QueryResult) -> Value {
    match result {
        QueryResult::Success(QueryOutput::ResultSet(set)) => json!({
            "status": "success",
            "columns": set.columns,
            "rows": set.rows,
        }),
        QueryResult::Success(QueryOutput::NoOutput {
            statements,
            rows_affected,
        }) => json!({
            "status": "success",
            "statements": statements,
            "rows_affected": rows_affected,
        }),
        QueryResult::Failure(err) => json!({
            "status": "error",
            "message": err.message(),
        }),
    }
}
