//! DeepLabCut-style CSV ingestion and artifact writing.
//!
//! The upstream tracker persists one table per video with a multi-row header:
//!
//! ```text
//! scorer,MODELNAME,MODELNAME,MODELNAME,...      (optional model level)
//! bodyparts,pupil_1,pupil_1,pupil_1,...
//! coords,x,y,likelihood,...
//! 0,103.2,88.1,0.998,...
//! 1,...
//! ```
//!
//! The first column carries the header labels and the frame index; it is not
//! part of the column set. When the `scorer` row is present, the model name is
//! retained on the table and the column keys are built from the remaining two
//! levels (the original tooling strips the model axis the same way).
//!
//! Missing values round-trip as empty cells.

use std::io::{Read, Write};

use camino::Utf8Path;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use itertools::izip;

use crate::keypoints::table::{ColumnKey, Component, KeypointTable};
use crate::pupillometry_errors::PupillometryError;

/// Read a keypoint table from a CSV file.
pub fn read_table(path: &Utf8Path) -> Result<KeypointTable, PupillometryError> {
    let file = std::fs::File::open(path.as_std_path())?;
    read_table_from(file)
}

/// Read a keypoint table from any reader (used directly by tests).
pub fn read_table_from<R: Read>(input: R) -> Result<KeypointTable, PupillometryError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut records = reader.records();

    let first = next_header_row(&mut records, "first header row")?;
    let (model, bodyparts_row) = match first.get(0) {
        Some("scorer") => {
            let model = first.get(1).map(str::to_owned);
            let bodyparts = next_header_row(&mut records, "bodyparts header row")?;
            (model, bodyparts)
        }
        Some("bodyparts") => (None, first),
        other => {
            return Err(PupillometryError::InvalidTableHeader(format!(
                "expected 'scorer' or 'bodyparts' in the first cell, found {other:?}"
            )))
        }
    };

    if bodyparts_row.get(0) != Some("bodyparts") {
        return Err(PupillometryError::InvalidTableHeader(
            "missing 'bodyparts' header row".into(),
        ));
    }
    let coords_row = next_header_row(&mut records, "coords header row")?;
    if coords_row.get(0) != Some("coords") {
        return Err(PupillometryError::InvalidTableHeader(
            "missing 'coords' header row".into(),
        ));
    }
    if bodyparts_row.len() != coords_row.len() {
        return Err(PupillometryError::InvalidTableHeader(format!(
            "bodyparts row has {} fields but coords row has {}",
            bodyparts_row.len(),
            coords_row.len()
        )));
    }

    let columns: Vec<ColumnKey> = izip!(bodyparts_row.iter().skip(1), coords_row.iter().skip(1))
        .map(|(bodypart, coord)| {
            let component = Component::parse(coord).ok_or_else(|| {
                PupillometryError::InvalidTableHeader(format!(
                    "unknown coordinate component {coord:?} for bodypart {bodypart:?}"
                ))
            })?;
            Ok(ColumnKey {
                bodypart: bodypart.to_owned(),
                component,
            })
        })
        .collect::<Result<_, PupillometryError>>()?;

    let mut data: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];
    for (row_idx, record) in records.enumerate() {
        let record = record?;
        if record.len() != columns.len() + 1 {
            return Err(PupillometryError::RowLengthMismatch {
                row: row_idx,
                expected: columns.len() + 1,
                got: record.len(),
            });
        }
        for (col_idx, cell) in record.iter().skip(1).enumerate() {
            data[col_idx].push(parse_cell(cell, row_idx, col_idx)?);
        }
    }

    Ok(KeypointTable::from_columns(model, columns, data))
}

/// Write a table back out in the same layout it was read from.
///
/// The model header row is emitted only when the table still carries a model
/// name; masked/interpolated artifacts keep it so downstream tooling can
/// trace which tracker produced them.
pub fn write_table(table: &KeypointTable, path: &Utf8Path) -> Result<(), PupillometryError> {
    let file = std::fs::File::create(path.as_std_path())?;
    write_table_to(table, file)
}

pub fn write_table_to<W: Write>(
    table: &KeypointTable,
    output: W,
) -> Result<(), PupillometryError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(output);
    let n_cols = table.n_columns();

    if let Some(model) = table.model() {
        let mut row = vec!["scorer"];
        row.extend(std::iter::repeat(model).take(n_cols));
        writer.write_record(&row)?;
    }

    let mut bodyparts = vec!["bodyparts".to_owned()];
    let mut coords = vec!["coords".to_owned()];
    for key in table.column_keys() {
        bodyparts.push(key.bodypart.clone());
        coords.push(key.component.label().to_owned());
    }
    writer.write_record(&bodyparts)?;
    writer.write_record(&coords)?;

    for frame in 0..table.n_frames() {
        let mut row = Vec::with_capacity(n_cols + 1);
        row.push(frame.to_string());
        for col in 0..n_cols {
            row.push(format_cell(table.column(col)[frame]));
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn next_header_row<I>(records: &mut I, what: &str) -> Result<StringRecord, PupillometryError>
where
    I: Iterator<Item = Result<StringRecord, csv::Error>>,
{
    records
        .next()
        .ok_or_else(|| PupillometryError::InvalidTableHeader(format!("missing {what}")))?
        .map_err(PupillometryError::from)
}

fn parse_cell(cell: &str, row: usize, column: usize) -> Result<f64, PupillometryError> {
    if cell.is_empty() || cell == "NaN" {
        return Ok(f64::NAN);
    }
    cell.parse()
        .map_err(|_| PupillometryError::InvalidCell {
            row,
            column,
            value: cell.to_owned(),
        })
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}
