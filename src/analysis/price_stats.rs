use std::cmp::Ordering;

use serde::Serialize;

use crate::analysis::{CATEGORY, REFERENCE_PRICE};
use crate::helpers::stats_helpers::round_to;
use crate::processor::columnar_table::ColumnarTable;
use crate::processor::{AggregateOp, FilterPredicate, ProcessorError};

/// Relative mean/median gap under which a category counts as symmetric
pub const SKEW_TOLERANCE: f64 = 0.05;

const PRICE_OPS: [AggregateOp; 5] = [
    AggregateOp::Mean,
    AggregateOp::Median,
    AggregateOp::StdDev,
    AggregateOp::Min,
    AggregateOp::Max,
];

/// Reference-price summary for one category, values rounded to two decimals.
///
/// `std_dev` is NaN when the category has fewer than two priced rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPriceStats {
    pub category: String,
    pub rows: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Skew {
    /// A few expensive products pull the mean above the median
    RightSkewed,
    Symmetric,
    LeftSkewed,
}

impl CategoryPriceStats {
    pub fn skew(&self) -> Skew {
        let gap = self.mean - self.median;
        let tolerance = self.median.abs() * SKEW_TOLERANCE;
        if gap > tolerance {
            Skew::RightSkewed
        } else if gap < -tolerance {
            Skew::LeftSkewed
        } else {
            Skew::Symmetric
        }
    }
}

/// Rows with a positive reference price. Missing (NaN) prices are excluded too.
pub fn price_valid_rows(table: &ColumnarTable) -> Result<Vec<usize>, ProcessorError> {
    let all: Vec<usize> = (0..table.row_count()).collect();
    restrict_to_valid_prices(table, &all)
}

/// The price filter over an existing selection; applying it twice changes nothing
pub fn restrict_to_valid_prices(
    table: &ColumnarTable,
    rows: &[usize],
) -> Result<Vec<usize>, ProcessorError> {
    table.filter_rows(rows, REFERENCE_PRICE, &positive())
}

pub(crate) fn positive() -> FilterPredicate {
    FilterPredicate::GreaterThan(0.0)
}

/// Mean, median and sample standard deviation of the reference price per
/// category over `rows`, sorted by descending standard deviation (NaN last,
/// ties keep alphabetical order).
pub fn category_price_stats(
    table: &ColumnarTable,
    rows: &[usize],
) -> Result<Vec<CategoryPriceStats>, ProcessorError> {
    let groups = table.group_by(rows, &[CATEGORY], REFERENCE_PRICE, &PRICE_OPS)?;

    let mut stats: Vec<CategoryPriceStats> = groups
        .into_iter()
        .map(|mut g| CategoryPriceStats {
            category: g.keys.swap_remove(0),
            rows: g.rows,
            mean: round_to(g.values[0], 2),
            median: round_to(g.values[1], 2),
            std_dev: round_to(g.values[2], 2),
            min: round_to(g.values[3], 2),
            max: round_to(g.values[4], 2),
        })
        .collect();

    stats.sort_by(|a, b| descending_nan_last(a.std_dev, b.std_dev));
    Ok(stats)
}

/// Descending order that puts NaN after every number
pub(crate) fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::table_from_rows;

    #[test]
    fn stats_are_sorted_by_dispersion_with_nan_last() {
        let table = table_from_rows(&[
            ("solo", "m", 50.0, 0.0),
            ("tight", "m", 10.0, 0.0),
            ("tight", "m", 12.0, 0.0),
            ("wide", "m", 1.0, 0.0),
            ("wide", "m", 100.0, 0.0),
        ]);
        let rows = price_valid_rows(&table).unwrap();
        let stats = category_price_stats(&table, &rows).unwrap();

        let order: Vec<&str> = stats.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(order, vec!["wide", "tight", "solo"]);
        assert!(stats[2].std_dev.is_nan());
        assert_eq!(stats[2].mean, 50.0);
        assert_eq!(stats[1].std_dev, 1.41);
        assert_eq!(stats[0].median, 50.5);
    }

    #[test]
    fn non_positive_and_missing_prices_are_excluded() {
        let table = table_from_rows(&[
            ("a", "m", 0.0, 1.0),
            ("a", "m", -3.0, 1.0),
            ("a", "m", f64::NAN, 1.0),
            ("a", "m", 8.0, 1.0),
        ]);
        assert_eq!(price_valid_rows(&table).unwrap(), vec![3]);
    }

    #[test]
    fn exact_half_means_round_to_even() {
        let table = table_from_rows(&[("A", "X", 1.0, 1.0), ("A", "X", 1.25, 1.25)]);
        let rows = price_valid_rows(&table).unwrap();
        let stats = category_price_stats(&table, &rows).unwrap();
        assert_eq!(stats[0].mean, 1.12);
        assert_eq!(stats[0].median, 1.12);
    }

    #[test]
    fn skew_classification() {
        let mut s = CategoryPriceStats {
            category: "x".into(),
            rows: 10,
            mean: 130.0,
            median: 100.0,
            std_dev: 1.0,
            min: 1.0,
            max: 500.0,
        };
        assert_eq!(s.skew(), Skew::RightSkewed);
        s.mean = 103.0;
        assert_eq!(s.skew(), Skew::Symmetric);
        s.mean = 80.0;
        assert_eq!(s.skew(), Skew::LeftSkewed);
    }
}
