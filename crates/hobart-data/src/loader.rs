//! Loader for sector-tagged price tables.
//!
//! Reads the CSV layout described in the crate docs and produces the
//! [`Universe`] and [`ReturnMatrix`] consumed by the estimation pipeline.
//! Any defect in the table is reported before a single window is estimated.

use crate::error::{DataError, Result};
use crate::returns::ReturnMatrix;
use crate::sector::Sector;
use crate::universe::{Instrument, Universe};
use chrono::NaiveDate;
use ndarray::Array2;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Universe plus its return series.
#[derive(Debug, Clone)]
pub struct MarketData {
    /// Instruments in column order.
    pub universe: Universe,
    /// Log returns, one column per instrument.
    pub returns: ReturnMatrix,
}

/// Reads price tables into [`MarketData`].
#[derive(Debug, Clone)]
pub struct PriceTableLoader {
    delimiter: u8,
    date_format: String,
}

impl Default for PriceTableLoader {
    fn default() -> Self {
        Self {
            delimiter: b',',
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl PriceTableLoader {
    /// Create a loader with the default comma delimiter and ISO dates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different field delimiter.
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Use a different date format for the index column.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Load a price table from a file.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<MarketData> {
        let file = File::open(path.as_ref())?;
        self.load_reader(file)
    }

    /// Load a price table from any reader.
    pub fn load_reader<R: Read>(&self, reader: R) -> Result<MarketData> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let names: Vec<String> = csv_reader
            .headers()?
            .iter()
            .skip(1)
            .map(str::to_string)
            .collect();

        let mut records = csv_reader.records();

        let sector_row = records.next().ok_or(DataError::InsufficientData {
            required: 1,
            actual: 0,
        })??;
        if sector_row.len() != names.len() + 1 {
            return Err(DataError::DimensionMismatch {
                expected: names.len() + 1,
                actual: sector_row.len(),
            });
        }

        let instruments = names
            .iter()
            .zip(sector_row.iter().skip(1))
            .map(|(name, label)| -> Result<Instrument> {
                Ok(Instrument::new(name.clone(), label.parse::<Sector>()?))
            })
            .collect::<Result<Vec<_>>>()?;
        let universe = Universe::new(instruments)?;

        let mut dates = Vec::new();
        let mut flat = Vec::new();
        for (row, record) in records.enumerate() {
            let record = record?;
            if record.len() != names.len() + 1 {
                return Err(DataError::DimensionMismatch {
                    expected: names.len() + 1,
                    actual: record.len(),
                });
            }

            dates.push(self.parse_date(row, &record[0])?);
            for (col, cell) in record.iter().skip(1).enumerate() {
                flat.push(parse_price(row, &names[col], cell)?);
            }
        }

        if dates.len() < 2 {
            return Err(DataError::InsufficientData {
                required: 2,
                actual: dates.len(),
            });
        }

        let prices = Array2::from_shape_vec((dates.len(), names.len()), flat).map_err(|_| {
            DataError::DimensionMismatch {
                expected: names.len(),
                actual: 0,
            }
        })?;
        let returns = ReturnMatrix::from_prices(&prices, &dates, &universe)?;

        tracing::info!(
            instruments = universe.len(),
            periods = returns.n_periods(),
            "loaded price table"
        );

        Ok(MarketData { universe, returns })
    }

    fn parse_date(&self, row: usize, raw: &str) -> Result<NaiveDate> {
        // Timestamps such as "2019-01-02 00:00:00" keep only their date part.
        let candidate = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(candidate, &self.date_format)
            .or_else(|_| NaiveDate::parse_from_str(raw, &self.date_format))
            .map_err(|_| DataError::InvalidDate {
                row,
                value: raw.to_string(),
            })
    }
}

fn parse_price(row: usize, column: &str, cell: &str) -> Result<f64> {
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(DataError::InvalidValue {
            row,
            column: column.to_string(),
            value: cell.to_string(),
        }),
    }
}
