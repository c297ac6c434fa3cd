//! Price source port trait.

use crate::domain::error::XsmomError;
use crate::domain::table::PriceTable;
use chrono::NaiveDate;

pub trait PriceSource {
    /// Adjusted prices for `universe` between `start_date` and `end_date`
    /// inclusive. Assets the source does not carry are left out of the
    /// returned table; a source carrying none of them fails with `NoData`.
    fn fetch_prices(
        &self,
        universe: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceTable, XsmomError>;

    fn list_assets(&self) -> Result<Vec<String>, XsmomError>;
}
