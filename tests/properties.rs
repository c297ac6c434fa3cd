//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. No look-ahead: a signal ignores returns of its own and later periods
//! 2. Selection size: exactly min(k, available signals) per period, where
//!    k = max(min_assets, ceil(n * top_pct))
//! 3. Weight normalization: invested rows sum to one, others are all zero
//! 4. Turnover bounds: every value in [0, 1], the first exactly 0
//! 5. Drawdown sign: never positive, zero only for a non-decreasing curve

mod common;

use common::month;
use proptest::prelude::*;
use xsmom::domain::metrics::{max_drawdown, turnover};
use xsmom::domain::momentum::signal;
use xsmom::domain::selection::{select, selection_size};
use xsmom::domain::table::{PeriodTable, ReturnTable};
use xsmom::domain::weights::equal_weights;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_cell() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        1 => Just(None::<f64>),
        9 => (-0.5..0.5_f64).prop_map(Some),
    ]
}

fn arb_rows() -> impl Strategy<Value = Vec<Vec<Option<f64>>>> {
    (1..6usize, 2..24usize).prop_flat_map(|(assets, periods)| {
        prop::collection::vec(prop::collection::vec(arb_cell(), assets), periods)
    })
}

fn table(rows: Vec<Vec<Option<f64>>>) -> ReturnTable {
    let n_assets = rows[0].len();
    let periods = (0..rows.len()).map(month).collect();
    let assets = (0..n_assets).map(|j| format!("A{j}")).collect();
    PeriodTable::new(periods, assets, rows).unwrap()
}

// ── 1. No look-ahead ─────────────────────────────────────────────────

proptest! {
    /// Rewriting returns from period t onward leaves signals up to t alone.
    #[test]
    fn signal_has_no_look_ahead(
        rows in arb_rows(),
        lookback in 1..5usize,
        cut in 0.0..1.0_f64,
        replacement in arb_cell(),
    ) {
        let t = ((rows.len() as f64) * cut) as usize;
        let mut altered = rows.clone();
        for row in altered.iter_mut().skip(t) {
            for cell in row.iter_mut() {
                *cell = replacement;
            }
        }

        let original = signal(&table(rows), lookback).unwrap();
        let changed = signal(&table(altered), lookback).unwrap();
        for i in 0..=t.min(original.n_periods() - 1) {
            prop_assert_eq!(original.row(i), changed.row(i), "row {} moved", i);
        }
    }
}

// ── 2. Selection bound / 3. Weight normalization ─────────────────────

proptest! {
    #[test]
    fn selection_holds_k_or_every_available_asset(
        rows in arb_rows(),
        lookback in 1..4usize,
        top_pct in 0.01..=1.0_f64,
        min_assets in 1..4usize,
    ) {
        let s = signal(&table(rows), lookback).unwrap();
        let mask = select(&s, top_pct, min_assets).unwrap();
        let k = selection_size(s.n_assets(), top_pct, min_assets).unwrap();
        for ((_, held), (_, sig)) in mask.rows().zip(s.rows()) {
            let count = held.iter().filter(|&&h| h).count();
            let available = sig.iter().filter(|v| v.is_some()).count();
            prop_assert!(count <= k);
            prop_assert_eq!(count, k.min(available));
            for (h, v) in held.iter().zip(sig) {
                prop_assert!(!*h || v.is_some(), "missing signal selected");
            }
        }
    }

    #[test]
    fn weights_sum_to_one_or_zero(
        rows in arb_rows(),
        lookback in 1..4usize,
        top_pct in 0.01..=1.0_f64,
    ) {
        let s = signal(&table(rows), lookback).unwrap();
        let mask = select(&s, top_pct, 1).unwrap();
        let weights = equal_weights(&mask);
        for ((_, held), (_, w)) in mask.rows().zip(weights.rows()) {
            if held.iter().any(|&h| h) {
                let total: f64 = w.iter().sum();
                prop_assert!((total - 1.0).abs() < 1e-12, "sum {}", total);
            } else {
                prop_assert!(w.iter().all(|&x| x == 0.0));
            }
        }
    }
}

// ── 4. Turnover bounds ───────────────────────────────────────────────

proptest! {
    #[test]
    fn turnover_is_a_fraction(
        rows in arb_rows(),
        lookback in 1..4usize,
        top_pct in 0.01..=1.0_f64,
    ) {
        let s = signal(&table(rows), lookback).unwrap();
        let weights = equal_weights(&select(&s, top_pct, 1).unwrap());
        let t = turnover(&weights);
        prop_assert_eq!(t.values()[0], 0.0);
        prop_assert!(t.values().iter().all(|v| (0.0..=1.0).contains(v)));
    }
}

// ── 5. Drawdown sign ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn drawdown_is_never_positive(
        equity in prop::collection::vec(0.1..10.0_f64, 1..40),
    ) {
        let dd = max_drawdown(&equity).unwrap();
        prop_assert!(dd <= 0.0);

        let non_decreasing = equity.windows(2).all(|w| w[1] >= w[0]);
        prop_assert_eq!(dd == 0.0, non_decreasing);
    }

    #[test]
    fn sorted_curve_has_no_drawdown(
        mut equity in prop::collection::vec(0.1..10.0_f64, 1..40),
    ) {
        equity.sort_by(f64::total_cmp);
        prop_assert_eq!(max_drawdown(&equity), Some(0.0));
    }
}
