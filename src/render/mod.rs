//! SVG charts for the analysis report.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};
use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

use crate::analysis::AnalysisReport;

pub mod bar_chart;
pub mod box_plot;
pub mod palette;
pub mod treemap;

pub const BOX_PLOT_FILE: &str = "price_boxplot.svg";
pub const BAR_CHART_FILE: &str = "discount_by_category.svg";
pub const TREEMAP_FILE: &str = "discount_treemap.svg";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Drawing error: {0}")]
    Drawing(#[from] DrawingAreaErrorKind<std::io::Error>),

    #[error("Nothing to draw: {0}")]
    Empty(&'static str),
}

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub out_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl ChartOptions {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            out_dir: PathBuf::from("charts"),
            width: 1200,
            height: 800,
        }
    }
}

/// Draw every chart the report has data for and return the written files
pub fn render_all(
    report: &AnalysisReport,
    options: &ChartOptions,
) -> Result<Vec<PathBuf>, RenderError> {
    std::fs::create_dir_all(&options.out_dir)?;
    let mut written = Vec::new();

    match &report.highest_dispersion {
        Some(selection) => {
            let path = options.out_dir.join(BOX_PLOT_FILE);
            box_plot::render_box_plot(selection, &path, options.size())?;
            written.push(path);
        }
        None => warn!("no category has two priced rows; skipping the box plot"),
    }

    if report.discount_by_category.is_empty() {
        warn!("no categories; skipping the discount bar chart");
    } else {
        let path = options.out_dir.join(BAR_CHART_FILE);
        bar_chart::render_bar_chart(&report.discount_by_category, &path, options.size())?;
        written.push(path);
    }

    if report.discount_by_brand.is_empty() {
        warn!("no positive discounts; skipping the treemap");
    } else {
        let path = options.out_dir.join(TREEMAP_FILE);
        treemap::render_treemap(&report.discount_by_brand, &path, options.size())?;
        written.push(path);
    }

    for path in &written {
        info!("chart written to {}", path.display());
    }
    Ok(written)
}

/// Hand a chart to the desktop's default viewer.
///
/// The platform launcher (`open`, `start`, `xdg-open`) returns once the viewer
/// is started, so it is waited on and its exit status checked.
pub fn open_in_viewer(path: &Path) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    let mut cmd = Command::new("open");

    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    };

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut cmd = Command::new("xdg-open");

    cmd.arg(path);
    run_launcher(cmd)
}

fn run_launcher(mut cmd: Command) -> std::io::Result<()> {
    let status = cmd.status()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!(
            "{} exited with {status}",
            cmd.get_program().to_string_lossy()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn launcher_is_reaped_and_failure_reported() {
        assert!(run_launcher(Command::new("true")).is_ok());

        let err = run_launcher(Command::new("false")).unwrap_err();
        assert!(err.to_string().contains("false exited with"));
    }

    #[test]
    fn missing_launcher_is_an_io_error() {
        let err = run_launcher(Command::new("no-such-viewer-binary")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
