use serde::Serialize;
use thiserror::Error;

pub mod column;
pub mod columnar_table;

use column::TextCell;

/// Error type used across the table layer
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema/parse error: {0}")]
    Parse(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column {column} is not {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
    },

    #[error("Mmap not loaded")]
    MmapNotLoaded,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ParseSummary {
    pub rows_processed: usize,
    pub errors: Vec<ParseError>,
}

/// A row the loader skipped. `line` is the 1-based line number in the file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    pub line: usize,
    pub column: String,
    pub value: String,
    pub error: Option<String>,
}

/// Output of parsing one newline-aligned chunk of the file
#[derive(Debug)]
pub(crate) struct BatchResult {
    pub float64_batches: Vec<Vec<f64>>,
    pub str_batches: Vec<Vec<TextCell>>,
    pub row_count: usize,
    /// Lines in the chunk, blank and rejected ones included
    pub lines_seen: usize,
    /// Errors with `line` relative to the chunk start (0-based)
    pub errors: Vec<ParseError>,
}

/// Row filter over one column
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPredicate {
    /// Text cell equal to the given string
    Equals(String),
    /// Numeric cell strictly above the threshold; NaN never matches
    GreaterThan(f64),
}

/// Aggregate operations. NaN inputs are skipped by every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    /// Arithmetic mean
    Mean,
    /// Middle value (average of the two middle values for even counts)
    Median,
    /// Sample standard deviation (n - 1 denominator), NaN below two values
    StdDev,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
}

/// One group of a group-by: the key values (one per group column), the number of
/// rows in the group, and one result per requested [`AggregateOp`].
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedAggregate {
    pub keys: Vec<String>,
    pub rows: usize,
    pub values: Vec<f64>,
}
