//! CSV price source and table persistence.
//!
//! Wide layout: a `date` column (YYYY-MM-DD) followed by one column per
//! asset. An empty cell (or `NaN`) is a missing observation. Floats are
//! written with Rust's shortest round-trip formatting, so a table read back
//! is bit-identical to the one written.

use crate::domain::error::XsmomError;
use crate::domain::table::{PeriodSeries, PeriodTable, PriceTable};
use crate::ports::data_port::PriceSource;
use chrono::NaiveDate;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A cell type that can be stored in a CSV field.
pub trait CsvCell: Sized + Clone {
    fn to_field(&self) -> String;
    fn from_field(field: &str) -> Result<Self, String>;
}

impl CsvCell for Option<f64> {
    fn to_field(&self) -> String {
        match self {
            Some(v) if !v.is_nan() => v.to_string(),
            _ => String::new(),
        }
    }

    fn from_field(field: &str) -> Result<Self, String> {
        let field = field.trim();
        if field.is_empty() {
            return Ok(None);
        }
        let value: f64 = field
            .parse()
            .map_err(|e| format!("invalid number {field:?}: {e}"))?;
        Ok((!value.is_nan()).then_some(value))
    }
}

impl CsvCell for f64 {
    fn to_field(&self) -> String {
        self.to_string()
    }

    fn from_field(field: &str) -> Result<Self, String> {
        field
            .trim()
            .parse()
            .map_err(|e| format!("invalid number {field:?}: {e}"))
    }
}

impl CsvCell for bool {
    fn to_field(&self) -> String {
        self.to_string()
    }

    fn from_field(field: &str) -> Result<Self, String> {
        match field.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(format!("invalid boolean {other:?}")),
        }
    }
}

pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<PriceTable, XsmomError> {
        let file = fs::File::open(&self.path).map_err(|e| {
            XsmomError::data(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        read_table(file)
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch_prices(
        &self,
        universe: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceTable, XsmomError> {
        let table = self.load()?;

        let mut found = Vec::with_capacity(universe.len());
        for asset in universe {
            if table.asset_index(asset).is_some() {
                found.push(asset.clone());
            } else {
                warn!(asset = %asset, path = %self.path.display(), "no price column, skipping");
            }
        }
        if found.is_empty() {
            return Err(XsmomError::NoData {
                reason: format!(
                    "none of the {} requested assets are in {}",
                    universe.len(),
                    self.path.display()
                ),
            });
        }

        let prices = table
            .select_assets(&found)?
            .slice_periods(Some(start_date), Some(end_date));
        info!(
            assets = prices.n_assets(),
            periods = prices.n_periods(),
            "loaded prices from {}",
            self.path.display()
        );
        Ok(prices)
    }

    fn list_assets(&self) -> Result<Vec<String>, XsmomError> {
        Ok(self.load()?.assets().to_vec())
    }
}

pub fn write_table<T: CsvCell, W: Write>(
    table: &PeriodTable<T>,
    writer: W,
) -> Result<(), XsmomError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = Vec::with_capacity(table.n_assets() + 1);
    header.push("date".to_string());
    header.extend(table.assets().iter().cloned());
    wtr.write_record(&header)?;

    for (period, row) in table.rows() {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(period.format(DATE_FORMAT).to_string());
        record.extend(row.iter().map(|cell| cell.to_field()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_table<T: CsvCell, R: Read>(reader: R) -> Result<PeriodTable<T>, XsmomError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let has_date = headers
        .get(0)
        .is_some_and(|h| h.trim().eq_ignore_ascii_case("date"));
    if !has_date {
        return Err(XsmomError::data("first column must be \"date\""));
    }
    let assets: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

    let mut periods = Vec::new();
    let mut rows = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        let date_str = record
            .get(0)
            .ok_or_else(|| XsmomError::data(format!("row {}: missing date", line + 1)))?;
        periods.push(parse_date(date_str)?);

        let row = (1..=assets.len())
            .map(|j| {
                T::from_field(record.get(j).unwrap_or(""))
                    .map_err(|e| XsmomError::data(format!("row {}: {}", line + 1, e)))
            })
            .collect::<Result<Vec<T>, _>>()?;
        rows.push(row);
    }

    PeriodTable::new(periods, assets, rows)
}

pub fn write_series<W: Write>(series: &PeriodSeries, column: &str, writer: W) -> Result<(), XsmomError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["date", column])?;
    for (period, value) in series.iter() {
        wtr.write_record([period.format(DATE_FORMAT).to_string(), value.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_series<R: Read>(reader: R) -> Result<PeriodSeries, XsmomError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut periods = Vec::new();
    let mut values = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        let date_str = record
            .get(0)
            .ok_or_else(|| XsmomError::data(format!("row {}: missing date", line + 1)))?;
        periods.push(parse_date(date_str)?);
        let value = f64::from_field(record.get(1).unwrap_or(""))
            .map_err(|e| XsmomError::data(format!("row {}: {}", line + 1, e)))?;
        values.push(value);
    }
    PeriodSeries::new(periods, values)
}

pub fn save_table<T: CsvCell>(table: &PeriodTable<T>, path: &Path) -> Result<(), XsmomError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_table(table, fs::File::create(path)?)
}

pub fn load_table<T: CsvCell>(path: &Path) -> Result<PeriodTable<T>, XsmomError> {
    read_table(fs::File::open(path)?)
}

fn parse_date(value: &str) -> Result<NaiveDate, XsmomError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| XsmomError::data(format!("invalid date {value:?}: {e}")))
}
