//! Plain-text summaries printed to stdout.

use std::io::{self, Write};

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::analysis::AnalysisReport;
use crate::analysis::discounts::{BrandDiscount, CategoryDiscount};
use crate::analysis::price_stats::{CategoryPriceStats, Skew};
use crate::processor::ProcessorError;
use crate::processor::columnar_table::ColumnarTable;

const RULE_WIDTH: usize = 50;

fn fmt_stat(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.2}")
    }
}

fn new_table<I, T>(header: I) -> Table
where
    I: IntoIterator<Item = T>,
    T: Into<Cell>,
{
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn number(v: f64) -> Cell {
    Cell::new(fmt_stat(v)).set_alignment(CellAlignment::Right)
}

/// First `n` rows of the table, every column
pub fn preview_table(table: &ColumnarTable, n: usize) -> Result<Table, ProcessorError> {
    let mut out = new_table(table.headers().iter().map(|h| h.as_str()));
    for row in 0..n.min(table.row_count()) {
        let cells = (0..table.headers().len())
            .map(|col| table.cell_display(col, row))
            .collect::<Result<Vec<_>, _>>()?;
        out.add_row(cells);
    }
    Ok(out)
}

pub fn mean_median_table(stats: &[CategoryPriceStats]) -> Table {
    let mut by_name: Vec<&CategoryPriceStats> = stats.iter().collect();
    by_name.sort_by(|a, b| a.category.cmp(&b.category));

    let mut table = new_table(["Categoria", "rows", "mean", "median"]);
    for s in by_name {
        table.add_row(vec![
            Cell::new(&s.category),
            Cell::new(s.rows).set_alignment(CellAlignment::Right),
            number(s.mean),
            number(s.median),
        ]);
    }
    table
}

pub fn std_dev_table(stats: &[CategoryPriceStats]) -> Table {
    let mut table = new_table(["Categoria", "std dev", "min", "max"]);
    for s in stats {
        table.add_row(vec![
            Cell::new(&s.category),
            number(s.std_dev),
            number(s.min),
            number(s.max),
        ]);
    }
    table
}

pub fn category_discount_table(discounts: &[CategoryDiscount]) -> Table {
    let mut table = new_table(["Categoria", "rows", "mean discount"]);
    for d in discounts {
        table.add_row(vec![
            Cell::new(&d.category),
            Cell::new(d.rows).set_alignment(CellAlignment::Right),
            number(d.mean_discount),
        ]);
    }
    table
}

/// The `top` (category, brand) pairs with the largest mean discount
pub fn top_brands_table(pairs: &[BrandDiscount], top: usize) -> Table {
    let mut ranked: Vec<&BrandDiscount> = pairs.iter().collect();
    ranked.sort_by(|a, b| b.mean_discount.total_cmp(&a.mean_discount));

    let mut table = new_table(["Categoria", "Marca", "rows", "mean discount"]);
    for p in ranked.into_iter().take(top) {
        table.add_row(vec![
            Cell::new(&p.category),
            Cell::new(&p.brand),
            Cell::new(p.rows).set_alignment(CellAlignment::Right),
            number(p.mean_discount),
        ]);
    }
    table
}

/// One line per skew class, naming the categories in it
pub fn skew_commentary(stats: &[CategoryPriceStats]) -> Vec<String> {
    let names = |class: Skew| {
        let mut v: Vec<&str> = stats
            .iter()
            .filter(|s| s.skew() == class)
            .map(|s| s.category.as_str())
            .collect();
        v.sort_unstable();
        v.join(", ")
    };

    let mut lines = Vec::new();
    for (class, text) in [
        (
            Skew::RightSkewed,
            "mean above median (a few expensive products pull the mean up)",
        ),
        (Skew::Symmetric, "mean close to median (roughly symmetric prices)"),
        (Skew::LeftSkewed, "mean below median"),
    ] {
        let members = names(class);
        if !members.is_empty() {
            lines.push(format!("- {text}: {members}"));
        }
    }
    lines
}

fn rule<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "\n{}\n", "=".repeat(RULE_WIDTH))
}

/// Print the whole analysis in pipeline order
pub fn write_report<W: Write>(
    out: &mut W,
    table: &ColumnarTable,
    report: &AnalysisReport,
    preview_rows: usize,
) -> anyhow::Result<()> {
    writeln!(out, "Dataset preview:")?;
    writeln!(out, "{}", preview_table(table, preview_rows)?)?;
    writeln!(
        out,
        "{} rows loaded, {} with a positive reference price",
        report.total_rows, report.price_valid_rows
    )?;
    if !report.parse_errors.is_empty() {
        writeln!(
            out,
            "{} malformed row(s) skipped (see log for details)",
            report.parse_errors.len()
        )?;
    }
    rule(out)?;

    writeln!(out, "# 1 - Mean and median reference price by category\n")?;
    writeln!(out, "{}", mean_median_table(&report.price_stats))?;
    for line in skew_commentary(&report.price_stats) {
        writeln!(out, "{line}")?;
    }
    rule(out)?;

    writeln!(out, "# 2 - Standard deviation by category\n")?;
    writeln!(out, "{}", std_dev_table(&report.price_stats))?;
    if report.price_stats.iter().any(|s| s.std_dev.is_nan()) {
        writeln!(
            out,
            "NaN: fewer than two priced rows, spread undefined for that category"
        )?;
    }
    rule(out)?;

    writeln!(out, "# 3 - Category with the highest standard deviation\n")?;
    match &report.highest_dispersion {
        Some(sel) => writeln!(
            out,
            "'{}' (std dev {}), {} priced rows in the box plot",
            sel.category,
            fmt_stat(sel.std_dev),
            sel.prices.len()
        )?,
        None => writeln!(out, "No category has a defined standard deviation")?,
    }
    rule(out)?;

    writeln!(out, "# 4 - Mean discount by category\n")?;
    writeln!(out, "{}", category_discount_table(&report.discount_by_category))?;
    rule(out)?;

    writeln!(out, "# 5 - Mean discount by category and brand\n")?;
    writeln!(
        out,
        "{} (category, brand) pairs with a positive discount; top 10:",
        report.discount_by_brand.len()
    )?;
    writeln!(out, "{}", top_brands_table(&report.discount_by_brand, 10))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(category: &str, mean: f64, median: f64, std_dev: f64) -> CategoryPriceStats {
        CategoryPriceStats {
            category: category.into(),
            rows: 3,
            mean,
            median,
            std_dev,
            min: 0.0,
            max: 100.0,
        }
    }

    #[test]
    fn nan_is_printed_not_zeroed() {
        let table = std_dev_table(&[stats("solo", 5.0, 5.0, f64::NAN)]).to_string();
        assert!(table.contains("NaN"));
        assert!(table.contains("100.00"));
    }

    #[test]
    fn commentary_groups_categories_by_skew() {
        let lines = skew_commentary(&[
            stats("lacteos", 150.0, 100.0, 1.0),
            stats("belleza", 300.0, 100.0, 1.0),
            stats("frutas", 100.0, 100.0, 1.0),
        ]);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("belleza, lacteos"));
        assert!(lines[1].ends_with("frutas"));
    }

    #[test]
    fn top_brands_are_ranked_and_truncated() {
        let pair = |b: &str, v: f64| BrandDiscount {
            category: "c".into(),
            brand: b.into(),
            rows: 1,
            mean_discount: v,
        };
        let rendered =
            top_brands_table(&[pair("low", 1.0), pair("high", 9.0), pair("mid", 5.0)], 2)
                .to_string();
        assert!(rendered.contains("high"));
        assert!(rendered.contains("mid"));
        assert!(!rendered.contains("low"));
        assert!(rendered.find("high") < rendered.find("mid"));
    }
}
