/// CSV export of rendered tables.
///
/// The header row is the table's column list; data rows follow in display
/// order, so the file matches what was printed.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::logging::{self, DataSource};
use crate::model::{PopError, Table};

/// Write `table` as CSV to `writer`.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<(), PopError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&table.columns)?;
    for row in &table.rows {
        if row.len() != table.columns.len() {
            return Err(PopError::ExportError(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                table.columns.len()
            )));
        }
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Serialize `table` to an in-memory CSV string.
pub fn to_csv_string(table: &Table) -> Result<String, PopError> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    String::from_utf8(buf).map_err(|e| PopError::ExportError(e.to_string()))
}

/// Read a CSV written by `write_csv` back into a (title-less) `Table`.
pub fn read_csv<R: Read>(reader: R) -> Result<Table, PopError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let columns = rdr.headers()?.iter().map(String::from).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(record?.iter().map(String::from).collect());
    }
    Ok(Table {
        title: String::new(),
        columns,
        rows,
    })
}

/// Write `table` to `dir/file_name`, creating `dir` if needed.
pub fn write_csv_file(table: &Table, dir: &Path, file_name: &str) -> Result<PathBuf, PopError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let file = File::create(&path)?;
    write_csv(table, file)?;

    logging::info(
        DataSource::Export,
        None,
        &format!("wrote {} rows to {}", table.rows.len(), path.display()),
    );
    Ok(path)
}

// ---------------------------------------------------------------------------
// File names
// ---------------------------------------------------------------------------

/// Lowercase, with every run of non-alphanumerics collapsed to `_`.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// `rogaland_befolkning_2024K1_2024K2.csv`
pub fn csv_file_name(subject: &str, from: &str, to: &str) -> String {
    if from == to {
        format!("{}_befolkning_{}.csv", slug(subject), from)
    } else {
        format!("{}_befolkning_{}_{}.csv", slug(subject), from, to)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
