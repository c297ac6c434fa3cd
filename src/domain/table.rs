//! Period-indexed tables and series.
//!
//! A [`PeriodTable`] is a dense row-major grid: strictly increasing period
//! labels down the rows, unique asset identifiers across the columns. Numeric
//! tables hold `Option<f64>` so a missing observation is `None` rather than a
//! NaN sentinel. Every transform returns a new table.

use crate::domain::error::XsmomError;
use chrono::NaiveDate;
use std::collections::HashSet;

pub type PriceTable = PeriodTable<Option<f64>>;
pub type ReturnTable = PeriodTable<Option<f64>>;
pub type SignalTable = PeriodTable<Option<f64>>;
pub type SelectionMask = PeriodTable<bool>;
pub type WeightTable = PeriodTable<f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodTable<T> {
    periods: Vec<NaiveDate>,
    assets: Vec<String>,
    cells: Vec<T>,
}

impl<T: Clone> PeriodTable<T> {
    /// Build a table from row vectors.
    ///
    /// Rows are sorted ascending by period; the caller's ordering does not
    /// need to be chronological. Duplicate periods, duplicate assets and
    /// ragged rows are rejected.
    pub fn new(
        periods: Vec<NaiveDate>,
        assets: Vec<String>,
        rows: Vec<Vec<T>>,
    ) -> Result<Self, XsmomError> {
        if periods.len() != rows.len() {
            return Err(XsmomError::table(format!(
                "{} periods but {} rows",
                periods.len(),
                rows.len()
            )));
        }
        check_unique_assets(&assets)?;

        let width = assets.len();
        let mut indexed: Vec<(NaiveDate, Vec<T>)> = Vec::with_capacity(rows.len());
        for (period, row) in periods.into_iter().zip(rows) {
            if row.len() != width {
                return Err(XsmomError::table(format!(
                    "row {} has {} cells, expected {}",
                    period,
                    row.len(),
                    width
                )));
            }
            indexed.push((period, row));
        }

        indexed.sort_by_key(|(period, _)| *period);
        if let Some(pair) = indexed.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(XsmomError::table(format!("duplicate period {}", pair[0].0)));
        }

        let mut periods = Vec::with_capacity(indexed.len());
        let mut cells = Vec::with_capacity(indexed.len() * width);
        for (period, row) in indexed {
            periods.push(period);
            cells.extend(row);
        }

        Ok(Self {
            periods,
            assets,
            cells,
        })
    }

    /// A table with no periods over the given asset columns.
    pub fn empty(assets: Vec<String>) -> Self {
        Self {
            periods: Vec::new(),
            assets,
            cells: Vec::new(),
        }
    }

    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn n_periods(&self) -> usize {
        self.periods.len()
    }

    pub fn n_assets(&self) -> usize {
        self.assets.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_periods(), self.n_assets())
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn row(&self, index: usize) -> &[T] {
        let width = self.assets.len();
        &self.cells[index * width..(index + 1) * width]
    }

    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, &[T])> + '_ {
        self.periods
            .iter()
            .enumerate()
            .map(move |(i, &period)| (period, self.row(i)))
    }

    pub fn get(&self, period_index: usize, asset_index: usize) -> &T {
        &self.cells[period_index * self.assets.len() + asset_index]
    }

    pub fn column(&self, asset_index: usize) -> impl Iterator<Item = &T> + '_ {
        let width = self.assets.len();
        self.cells.iter().skip(asset_index).step_by(width.max(1)).take(self.periods.len())
    }

    pub fn asset_index(&self, asset: &str) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    pub fn period_index(&self, period: NaiveDate) -> Option<usize> {
        self.periods.binary_search(&period).ok()
    }

    /// Look up a cell by labels.
    pub fn at(&self, period: NaiveDate, asset: &str) -> Option<&T> {
        let i = self.period_index(period)?;
        let j = self.asset_index(asset)?;
        Some(self.get(i, j))
    }

    /// Keep only the named columns, in the order given.
    pub fn select_assets(&self, assets: &[String]) -> Result<Self, XsmomError> {
        check_unique_assets(assets)?;
        let indices = assets
            .iter()
            .map(|a| {
                self.asset_index(a)
                    .ok_or_else(|| XsmomError::table(format!("unknown asset {a}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut cells = Vec::with_capacity(self.periods.len() * indices.len());
        for i in 0..self.periods.len() {
            let row = self.row(i);
            cells.extend(indices.iter().map(|&j| row[j].clone()));
        }

        Ok(Self {
            periods: self.periods.clone(),
            assets: assets.to_vec(),
            cells,
        })
    }

    /// Rows whose period lies within `[start, end]`; `None` leaves a side open.
    pub fn slice_periods(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let (lo, hi) = bounds(&self.periods, start, end);
        let width = self.assets.len();
        Self {
            periods: self.periods[lo..hi].to_vec(),
            assets: self.assets.clone(),
            cells: self.cells[lo * width..hi * width].to_vec(),
        }
    }

    /// Apply `f` to each row independently. `f` must return one value per asset.
    pub fn map_rows<U, F>(&self, mut f: F) -> PeriodTable<U>
    where
        F: FnMut(&[T]) -> Vec<U>,
    {
        let width = self.assets.len();
        let mut cells = Vec::with_capacity(self.cells.len());
        for i in 0..self.periods.len() {
            let out = f(self.row(i));
            assert_eq!(out.len(), width, "row transform changed the row width");
            cells.extend(out);
        }
        PeriodTable {
            periods: self.periods.clone(),
            assets: self.assets.clone(),
            cells,
        }
    }

    /// Apply `f` to each asset column independently. `f` must return one
    /// value per period.
    pub fn map_columns<U, F>(&self, mut f: F) -> PeriodTable<U>
    where
        U: Clone + Default,
        F: FnMut(&[T]) -> Vec<U>,
    {
        let height = self.periods.len();
        let width = self.assets.len();
        let mut cells = vec![U::default(); height * width];
        for j in 0..width {
            let column: Vec<T> = self.column(j).cloned().collect();
            let out = f(&column);
            assert_eq!(out.len(), height, "column transform changed the column length");
            for (i, value) in out.into_iter().enumerate() {
                cells[i * width + j] = value;
            }
        }
        PeriodTable {
            periods: self.periods.clone(),
            assets: self.assets.clone(),
            cells,
        }
    }
}

/// One scalar per period: portfolio returns, equity curves, turnover.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PeriodSeries {
    periods: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl PeriodSeries {
    pub fn new(periods: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, XsmomError> {
        if periods.len() != values.len() {
            return Err(XsmomError::table(format!(
                "{} periods but {} values",
                periods.len(),
                values.len()
            )));
        }
        check_increasing(&periods)?;
        Ok(Self { periods, values })
    }

    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.periods.iter().copied().zip(self.values.iter().copied())
    }

    pub fn get(&self, period: NaiveDate) -> Option<f64> {
        let i = self.periods.binary_search(&period).ok()?;
        Some(self.values[i])
    }

    pub fn slice_periods(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let (lo, hi) = bounds(&self.periods, start, end);
        Self {
            periods: self.periods[lo..hi].to_vec(),
            values: self.values[lo..hi].to_vec(),
        }
    }

    pub(crate) fn from_parts(periods: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        debug_assert_eq!(periods.len(), values.len());
        Self { periods, values }
    }
}

fn bounds(
    periods: &[NaiveDate],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> (usize, usize) {
    let lo = start.map_or(0, |s| periods.partition_point(|p| *p < s));
    let hi = end.map_or(periods.len(), |e| periods.partition_point(|p| *p <= e));
    (lo, hi.max(lo))
}

fn check_unique_assets(assets: &[String]) -> Result<(), XsmomError> {
    let mut seen = HashSet::new();
    for asset in assets {
        if !seen.insert(asset.as_str()) {
            return Err(XsmomError::table(format!("duplicate asset {asset}")));
        }
    }
    Ok(())
}

fn check_increasing(periods: &[NaiveDate]) -> Result<(), XsmomError> {
    match periods.windows(2).find(|w| w[0] >= w[1]) {
        Some(w) => Err(XsmomError::table(format!(
            "periods not strictly increasing at {} -> {}",
            w[0], w[1]
        ))),
        None => Ok(()),
    }
}
