//! # supermarket_eda
//!
//! Exploratory price and discount analysis of a supermarket product listing.
//!
//! - Memory-mapped CSV loading, chunks parsed in parallel with Rayon
//! - Columnar storage: `f64` vectors for prices/discounts, byte offsets for text
//! - AVX2-accelerated filtering with a scalar fallback
//! - Per-category mean, median and sample standard deviation of `Preco_Normal`
//! - Mean `Desconto` per category and per (category, brand)
//! - SVG box plot, bar chart and treemap via `plotters`
//!
//! # Example
//!
//! ```no_run
//! use supermarket_eda::analysis::{analyze, load_products};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (table, summary) = load_products(Path::new("products.csv"))?;
//!     let report = analyze(&table, summary)?;
//!
//!     for s in &report.price_stats {
//!         println!("{} => mean {} / std {}", s.category, s.mean, s.std_dev);
//!     }
//!     if let Some(widest) = &report.highest_dispersion {
//!         println!("widest spread: {}", widest.category);
//!     }
//!     Ok(())
//! }
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::Context;
use log::warn;

mod helpers;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod processor;
pub mod render;
pub mod report;

use analysis::{AnalysisReport, analyze, load_products};
use config::AnalysisConfig;

/// Run the whole pipeline: load, analyse, print to `out`, then draw and
/// export whatever `config` asks for.
pub fn run<W: Write>(config: &AnalysisConfig, out: &mut W) -> anyhow::Result<AnalysisReport> {
    let (table, summary) = load_products(&config.input)
        .with_context(|| format!("could not load {}", config.input.display()))?;
    for e in summary.errors.iter().take(10) {
        warn!(
            "line {}: {} {}",
            e.line,
            e.value,
            e.error.as_deref().unwrap_or_default()
        );
    }

    let report = analyze(&table, summary)?;
    report::write_report(out, &table, &report, config.preview_rows)?;

    if let Some(options) = &config.charts {
        let written = render::render_all(&report, options).context("could not draw charts")?;
        for path in &written {
            writeln!(out, "chart: {}", path.display())?;
            if config.open_charts {
                if let Err(e) = render::open_in_viewer(path) {
                    warn!("could not open {}: {e}", path.display());
                }
            }
        }
    }

    if let Some(path) = &config.json_report {
        let file =
            File::create(path).with_context(|| format!("could not create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writer.flush()?;
        writeln!(out, "report: {}", path.display())?;
    }

    Ok(report)
}
