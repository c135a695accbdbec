use std::path::PathBuf;

use crate::render::ChartOptions;

/// Everything one analysis run needs, resolved from the command line
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub input: PathBuf,
    pub preview_rows: usize,
    /// `None` when charts are disabled
    pub charts: Option<ChartOptions>,
    pub open_charts: bool,
    pub json_report: Option<PathBuf>,
}

impl AnalysisConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        AnalysisConfig {
            input: input.into(),
            preview_rows: 5,
            charts: Some(ChartOptions::default()),
            open_charts: false,
            json_report: None,
        }
    }
}
