//! Delimited-text record reading.
//!
//! Parses a header-bearing CSV source into raw text records with
//! day-resolution timestamps, and extracts typed value columns.

use chrono::NaiveDate;
use s2f_core::{Error, Result, TimeSeries};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// Reader for delimited text sources with a header row.
///
/// The first row after the skipped rows is the header; each subsequent row
/// becomes one record in strict input order. No numeric coercion happens
/// here; fields stay text until a column is extracted.
#[derive(Debug, Clone, Copy)]
pub struct TabularReader {
    /// Rows to skip before the header.
    skip_rows: usize,
}

/// One source row: a day-resolution date plus the remaining fields as text.
#[derive(Debug, Clone, Serialize)]
pub struct RawRecord {
    /// Date parsed from the first field (time-of-day discarded).
    pub date: NaiveDate,
    /// The non-date fields, unparsed.
    pub values: Vec<String>,
}

/// Header plus records, in strict input order.
#[derive(Debug, Clone, Serialize)]
pub struct RawTable {
    /// Field names from the header row.
    pub header: Vec<String>,
    /// Data rows.
    pub records: Vec<RawRecord>,
}

/// A typed column extraction with coercion diagnostics.
#[derive(Debug, Clone)]
pub struct ColumnSeries {
    /// The extracted series.
    pub series: TimeSeries,
    /// Record indices whose empty field was coerced to zero.
    pub coerced_rows: Vec<usize>,
}

impl TabularReader {
    /// Create a reader that skips `skip_rows` rows before the header.
    pub fn new(skip_rows: usize) -> Self {
        Self { skip_rows }
    }

    /// Read a delimited text file into a raw table.
    ///
    /// Fails with `NotFound` if the path does not exist, `MalformedRow` if a
    /// row's field count mismatches the header, and `InvalidTimestamp` if a
    /// date field does not parse.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<RawTable> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut header: Option<Vec<String>> = None;
        let mut records = Vec::new();

        for (row, result) in csv_reader.records().enumerate() {
            if row < self.skip_rows {
                continue;
            }
            let record = result?;
            let fields: Vec<String> = record.iter().map(|f| f.to_string()).collect();
            match &header {
                None => header = Some(fields),
                Some(names) => {
                    if fields.len() != names.len() {
                        return Err(Error::MalformedRow {
                            row,
                            expected: names.len(),
                            found: fields.len(),
                        });
                    }
                    let date = parse_day(&fields[0], row)?;
                    records.push(RawRecord {
                        date,
                        values: fields[1..].to_vec(),
                    });
                }
            }
        }

        let header = header
            .ok_or_else(|| Error::data(format!("{}: no header row found", path.display())))?;
        debug!(path = %path.display(), rows = records.len(), "read raw table");
        Ok(RawTable { header, records })
    }

    /// Read one value column of a file directly as a time series.
    pub fn read_series(
        &self,
        path: impl AsRef<Path>,
        value_column: usize,
        name: impl Into<String>,
    ) -> Result<ColumnSeries> {
        self.read(path)?.time_series(value_column, name)
    }
}

impl Default for TabularReader {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RawTable {
    /// Extract one numeric value column as a time series.
    ///
    /// `value_column` is 0-based among the non-date fields. Empty fields
    /// coerce to zero; the affected record indices are reported so callers
    /// can flag the coercion.
    pub fn time_series(
        &self,
        value_column: usize,
        name: impl Into<String>,
    ) -> Result<ColumnSeries> {
        let name = name.into();
        let mut dates = Vec::with_capacity(self.records.len());
        let mut values = Vec::with_capacity(self.records.len());
        let mut coerced_rows = Vec::new();

        for (i, record) in self.records.iter().enumerate() {
            let field = record.values.get(value_column).ok_or_else(|| {
                Error::data(format!(
                    "record {}: no value column {} (have {})",
                    i,
                    value_column,
                    record.values.len()
                ))
            })?;
            let value = if field.is_empty() {
                coerced_rows.push(i);
                0.0
            } else {
                field.parse::<f64>().map_err(|_| {
                    Error::data(format!("record {}: cannot parse {:?} as a number", i, field))
                })?
            };
            dates.push(record.date);
            values.push(value);
        }

        if !coerced_rows.is_empty() {
            warn!(
                series = %name,
                coerced = coerced_rows.len(),
                "empty fields coerced to zero"
            );
        }
        let series = TimeSeries::new(name, dates, values)?;
        Ok(ColumnSeries {
            series,
            coerced_rows,
        })
    }
}

/// Parse a day-resolution date. Only the first 10 characters are
/// significant; trailing time-of-day text is discarded.
fn parse_day(text: &str, row: usize) -> Result<NaiveDate> {
    let day = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| Error::InvalidTimestamp {
        row,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_basic() {
        let file = write_temp(
            "Timestamp,Market Cap\n\
             2021-01-04,100.5\n\
             2021-01-05,101.25\n",
        );
        let table = TabularReader::new(0).read(file.path()).unwrap();

        assert_eq!(table.header, vec!["Timestamp", "Market Cap"]);
        assert_eq!(table.records.len(), 2);
        assert_eq!(
            table.records[0].date,
            NaiveDate::from_ymd_opt(2021, 1, 4).unwrap()
        );
        assert_eq!(table.records[1].values, vec!["101.25"]);
    }

    #[test]
    fn test_time_of_day_discarded() {
        let file = write_temp(
            "Timestamp,Stock\n\
             2021-01-04 00:00:00,50.0\n",
        );
        let table = TabularReader::new(0).read(file.path()).unwrap();
        assert_eq!(
            table.records[0].date,
            NaiveDate::from_ymd_opt(2021, 1, 4).unwrap()
        );
    }

    #[test]
    fn test_skip_rows() {
        let file = write_temp(
            "junk line\n\
             Timestamp,Stock\n\
             2021-01-04,50.0\n",
        );
        let table = TabularReader::new(1).read(file.path()).unwrap();
        assert_eq!(table.header, vec!["Timestamp", "Stock"]);
        assert_eq!(table.records.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let result = TabularReader::new(0).read("/no/such/file.csv");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_malformed_row() {
        let file = write_temp(
            "Timestamp,Stock\n\
             2021-01-04,50.0,extra\n",
        );
        let result = TabularReader::new(0).read(file.path());
        match result {
            Err(Error::MalformedRow {
                row,
                expected,
                found,
            }) => {
                assert_eq!(row, 1);
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("expected MalformedRow, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_invalid_timestamp() {
        let file = write_temp(
            "Timestamp,Stock\n\
             not-a-date,50.0\n",
        );
        let result = TabularReader::new(0).read(file.path());
        assert!(matches!(result, Err(Error::InvalidTimestamp { .. })));
    }

    #[test]
    fn test_column_extraction_coerces_empty_to_zero() {
        let file = write_temp(
            "Timestamp,Stock\n\
             2021-01-04,50.0\n\
             2021-01-05,\n\
             2021-01-06,52.5\n",
        );
        let table = TabularReader::new(0).read(file.path()).unwrap();
        let column = table.time_series(0, "Stock").unwrap();

        assert_eq!(column.series.values(), &[50.0, 0.0, 52.5]);
        assert_eq!(column.coerced_rows, vec![1]);
        assert_relative_eq!(column.series.values()[2], 52.5);
    }

    #[test]
    fn test_column_extraction_rejects_garbage() {
        let file = write_temp(
            "Timestamp,Stock\n\
             2021-01-04,abc\n",
        );
        let table = TabularReader::new(0).read(file.path()).unwrap();
        assert!(table.time_series(0, "Stock").is_err());
    }
}
