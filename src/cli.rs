use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::AnalysisConfig;
use crate::render::ChartOptions;

#[derive(Parser, Debug)]
#[command(name = "supermarket-eda")]
#[command(about = "Price and discount analysis of a supermarket product listing", long_about = None)]
#[command(version)]
pub struct Cli {
    /// CSV file with Categoria, Marca, Preco_Normal and Desconto columns
    #[arg(env = "SUPERMARKET_CSV")]
    pub input: PathBuf,

    /// Directory for the SVG charts
    #[arg(short, long, default_value = "charts")]
    pub out_dir: PathBuf,

    /// Rows shown in the dataset preview
    #[arg(long, default_value_t = 5)]
    pub head: usize,

    /// Only print the tables, draw no charts
    #[arg(long)]
    pub no_charts: bool,

    /// Open each chart in the default viewer once written
    #[arg(long, conflicts_with = "no_charts")]
    pub open: bool,

    /// Also write the full report as JSON to this file
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Chart width in pixels
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Chart height in pixels
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn into_config(self) -> AnalysisConfig {
        AnalysisConfig {
            input: self.input,
            preview_rows: self.head,
            charts: (!self.no_charts).then(|| ChartOptions {
                out_dir: self.out_dir,
                width: self.width,
                height: self.height,
            }),
            open_charts: self.open,
            json_report: self.json,
        }
    }
}
