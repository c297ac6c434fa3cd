//! Equal-weight portfolio construction from a selection mask.

use crate::domain::table::{SelectionMask, WeightTable};

/// `1 / count` for each selected asset; an empty selection is an all-cash
/// (all-zero) row. Nothing carries over from earlier periods.
pub fn equal_weights(mask: &SelectionMask) -> WeightTable {
    mask.map_rows(|row| {
        let count = row.iter().filter(|&&held| held).count();
        if count == 0 {
            return vec![0.0; row.len()];
        }
        let weight = 1.0 / count as f64;
        row.iter()
            .map(|&held| if held { weight } else { 0.0 })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::PeriodTable;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn mask(rows: Vec<Vec<bool>>) -> SelectionMask {
        let periods = (0..rows.len())
            .map(|i| NaiveDate::from_ymd_opt(2024, i as u32 + 1, 1).unwrap())
            .collect();
        let width = rows.first().map_or(0, Vec::len);
        let assets = (0..width).map(|j| format!("A{j}")).collect();
        PeriodTable::new(periods, assets, rows).unwrap()
    }

    #[test]
    fn selected_assets_share_equally() {
        let weights = equal_weights(&mask(vec![vec![true, false, true, true]]));
        let row = weights.row(0);
        assert_relative_eq!(row[0], 1.0 / 3.0);
        assert_eq!(row[1], 0.0);
        assert_relative_eq!(row.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_selection_is_cash() {
        let weights = equal_weights(&mask(vec![vec![false, false], vec![true, false]]));
        assert_eq!(weights.row(0), &[0.0, 0.0]);
        assert_eq!(weights.row(1), &[1.0, 0.0]);
    }

    #[test]
    fn no_carry_forward_between_periods() {
        let weights = equal_weights(&mask(vec![vec![true, true], vec![false, false]]));
        assert_eq!(weights.row(0), &[0.5, 0.5]);
        assert_eq!(weights.row(1), &[0.0, 0.0]);
    }
}
