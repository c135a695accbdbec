//! The analysis pipeline over a loaded product table.
//!
//! Every step takes the immutable [`ColumnarTable`] (and a row selection where
//! relevant) and returns a new derived value; [`analyze`] composes them.

use std::path::Path;

use log::info;
use serde::Serialize;

use crate::processor::columnar_table::ColumnarTable;
use crate::processor::column::ColumnType;
use crate::processor::{ParseError, ParseSummary, ProcessorError};

pub mod discounts;
pub mod dispersion;
pub mod price_stats;

use discounts::{BrandDiscount, CategoryDiscount, mean_discount_by_brand, mean_discount_by_category};
use dispersion::{DispersionSelection, select_highest_dispersion};
use price_stats::{CategoryPriceStats, category_price_stats, price_valid_rows};

pub const CATEGORY: &str = "Categoria";
pub const BRAND: &str = "Marca";
pub const REFERENCE_PRICE: &str = "Preco_Normal";
pub const DISCOUNT: &str = "Desconto";

/// Columns parsed as numbers; everything else stays text
pub const NUMERIC_COLUMNS: [&str; 2] = [REFERENCE_PRICE, DISCOUNT];

/// Load a product listing and check that the four analysed columns exist
pub fn load_products(path: &Path) -> Result<(ColumnarTable, ParseSummary), ProcessorError> {
    let mut table = ColumnarTable::new();
    let summary = table.load_csv(path, &NUMERIC_COLUMNS)?;

    for name in [CATEGORY, BRAND] {
        if table.get_col(name)?.column_type() != ColumnType::Str {
            return Err(ProcessorError::TypeMismatch {
                column: name.to_string(),
                expected: ColumnType::Str.name(),
            });
        }
    }

    info!(
        "loaded {} rows ({} columns) from {}",
        table.row_count(),
        table.headers().len(),
        path.display()
    );
    Ok((table, summary))
}

/// Everything the pipeline derives from one table
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub total_rows: usize,
    pub price_valid_rows: usize,
    pub parse_errors: Vec<ParseError>,
    pub price_stats: Vec<CategoryPriceStats>,
    pub highest_dispersion: Option<DispersionSelection>,
    pub discount_by_category: Vec<CategoryDiscount>,
    pub discount_by_brand: Vec<BrandDiscount>,
}

pub fn analyze(
    table: &ColumnarTable,
    summary: ParseSummary,
) -> Result<AnalysisReport, ProcessorError> {
    let valid_rows = price_valid_rows(table)?;
    info!(
        "{} of {} rows have a positive reference price",
        valid_rows.len(),
        table.row_count()
    );

    let price_stats = category_price_stats(table, &valid_rows)?;
    let highest_dispersion = select_highest_dispersion(table, &valid_rows, &price_stats)?;
    let discount_by_category = mean_discount_by_category(table)?;
    let discount_by_brand = mean_discount_by_brand(table)?;

    Ok(AnalysisReport {
        total_rows: table.row_count(),
        price_valid_rows: valid_rows.len(),
        parse_errors: summary.errors,
        price_stats,
        highest_dispersion,
        discount_by_category,
        discount_by_brand,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    /// Build a table from (category, brand, reference price, discount) rows.
    /// NaN is written as an empty cell.
    pub fn table_from_rows(rows: &[(&str, &str, f64, f64)]) -> ColumnarTable {
        let cell = |v: f64| if v.is_nan() { String::new() } else { v.to_string() };

        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "Titulo,Categoria,Marca,Preco_Normal,Desconto").unwrap();
        for (i, (cat, brand, price, discount)) in rows.iter().enumerate() {
            writeln!(
                tmp,
                "item {i},{cat},{brand},{},{}",
                cell(*price),
                cell(*discount)
            )
            .unwrap();
        }

        let (table, summary) = load_products(tmp.path()).unwrap();
        assert!(summary.errors.is_empty());
        table
    }
}
