use serde::Serialize;

use crate::analysis::price_stats::{descending_nan_last, positive};
use crate::analysis::{BRAND, CATEGORY, DISCOUNT};
use crate::helpers::stats_helpers::round_to;
use crate::processor::columnar_table::ColumnarTable;
use crate::processor::{AggregateOp, ProcessorError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDiscount {
    pub category: String,
    pub rows: usize,
    pub mean_discount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandDiscount {
    pub category: String,
    pub brand: String,
    pub rows: usize,
    pub mean_discount: f64,
}

/// Mean discount per category over every loaded row (no price filter, zero
/// discounts count), rounded to two decimals and sorted descending.
pub fn mean_discount_by_category(
    table: &ColumnarTable,
) -> Result<Vec<CategoryDiscount>, ProcessorError> {
    let all: Vec<usize> = (0..table.row_count()).collect();
    let mut out: Vec<CategoryDiscount> = table
        .group_by(&all, &[CATEGORY], DISCOUNT, &[AggregateOp::Mean])?
        .into_iter()
        .map(|mut g| CategoryDiscount {
            category: g.keys.swap_remove(0),
            rows: g.rows,
            mean_discount: round_to(g.values[0], 2),
        })
        .collect();

    out.sort_by(|a, b| descending_nan_last(a.mean_discount, b.mean_discount));
    Ok(out)
}

/// Mean discount per (category, brand) over rows with a positive discount,
/// ordered by category then brand.
pub fn mean_discount_by_brand(
    table: &ColumnarTable,
) -> Result<Vec<BrandDiscount>, ProcessorError> {
    let discounted = table.filter(DISCOUNT, &positive())?;

    Ok(table
        .group_by(&discounted, &[CATEGORY, BRAND], DISCOUNT, &[AggregateOp::Mean])?
        .into_iter()
        .map(|mut g| {
            let brand = g.keys.swap_remove(1);
            BrandDiscount {
                category: g.keys.swap_remove(0),
                brand,
                rows: g.rows,
                mean_discount: g.values[0],
            }
        })
        .collect())
}
