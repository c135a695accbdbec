use serde::Serialize;

use crate::analysis::price_stats::CategoryPriceStats;
use crate::analysis::{CATEGORY, REFERENCE_PRICE};
use crate::processor::columnar_table::ColumnarTable;
use crate::processor::{FilterPredicate, ProcessorError};

/// The category with the widest price spread and its priced rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispersionSelection {
    pub category: String,
    pub std_dev: f64,
    #[serde(skip)]
    pub rows: Vec<usize>,
    pub prices: Vec<f64>,
}

/// Entry with the largest standard deviation; the first one wins a tie.
/// NaN deviations never win, so `None` means no category has two priced rows.
pub fn max_dispersion(stats: &[CategoryPriceStats]) -> Option<&CategoryPriceStats> {
    stats
        .iter()
        .filter(|s| !s.std_dev.is_nan())
        .fold(None, |best: Option<&CategoryPriceStats>, s| match best {
            Some(b) if b.std_dev >= s.std_dev => Some(b),
            _ => Some(s),
        })
}

/// Pick the most dispersed category and narrow `valid_rows` down to it
pub fn select_highest_dispersion(
    table: &ColumnarTable,
    valid_rows: &[usize],
    stats: &[CategoryPriceStats],
) -> Result<Option<DispersionSelection>, ProcessorError> {
    let Some(best) = max_dispersion(stats) else {
        return Ok(None);
    };

    let rows = table.filter_rows(
        valid_rows,
        CATEGORY,
        &FilterPredicate::Equals(best.category.clone()),
    )?;
    let prices = table.numeric_values(REFERENCE_PRICE)?;

    Ok(Some(DispersionSelection {
        category: best.category.clone(),
        std_dev: best.std_dev,
        prices: rows.iter().map(|&r| prices[r]).collect(),
        rows,
    }))
}
