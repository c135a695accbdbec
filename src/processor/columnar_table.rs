use log::{debug, warn};
use memchr::{memchr, memchr_iter, memmem};
use memmap2::Mmap;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::{
    borrow::Cow,
    collections::{BTreeMap, HashSet},
    fs::File,
    path::Path,
};

use crate::{
    helpers::{simd_helpers::filter_gt_f64, stats_helpers::aggregate_values},
    processor::{
        AggregateOp, BatchResult, FilterPredicate, GroupedAggregate, ParseError, ParseSummary,
        ProcessorError,
        column::{Column, ColumnType, TextCell},
    },
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Immutable columnar view over a memory-mapped CSV file.
///
/// Numeric columns are parsed eagerly into `f64` vectors. Text columns keep
/// absolute byte offsets into the mapping and are only decoded when read;
/// quoted fields with doubled quotes are the exception and own their text.
///
/// # Examples
///
/// ```no_run
/// # use supermarket_eda::processor::columnar_table::ColumnarTable;
/// # use supermarket_eda::processor::FilterPredicate;
/// let mut table = ColumnarTable::new();
/// table.load_csv("products.csv".as_ref(), &["Preco_Normal"]).unwrap();
/// let priced = table
///     .filter("Preco_Normal", &FilterPredicate::GreaterThan(0.0))
///     .unwrap();
/// println!("{} rows with a reference price", priced.len());
/// ```
#[derive(Debug)]
pub struct ColumnarTable {
    mmap: Option<Mmap>,   // owns the CSV bytes
    columns: Vec<Column>, // one per header, same order
    row_count: usize,
    headers: Vec<String>,
}

impl ColumnarTable {
    /// Create an empty table
    pub fn new() -> Self {
        ColumnarTable {
            mmap: None,
            columns: Vec::new(),
            row_count: 0,
            headers: Vec::new(),
        }
    }

    /// Loads a CSV file using memory mapping.
    ///
    /// Columns named in `numeric_columns` are parsed as `f64` (an empty cell
    /// becomes NaN); every other column is kept as text.
    ///
    /// # Errors
    /// Returns a [`ProcessorError`] if:
    /// - the file cannot be opened or mapped
    /// - there is no header line
    /// - one of `numeric_columns` is absent from the header
    ///
    /// Malformed rows are not errors: they are skipped and reported in the
    /// returned [`ParseSummary`].
    pub fn load_csv(
        &mut self,
        path: &Path,
        numeric_columns: &[&str],
    ) -> Result<ParseSummary, ProcessorError> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and owned by the table for its whole lifetime.
        let mmap = unsafe { Mmap::map(&file)? };
        let buf: &[u8] = &mmap[..];

        let bom_len = if buf.starts_with(UTF8_BOM) {
            UTF8_BOM.len()
        } else {
            0
        };

        // Parse header, skipping blank lines in front of it
        let mut header_start = bom_len;
        let mut header_line_no = 1;
        let (header_end, header_line) = loop {
            let end = memchr(b'\n', &buf[header_start..])
                .map(|pos| header_start + pos)
                .unwrap_or(buf.len());
            let line = trim_cr(&buf[header_start..end]);
            if !line.is_empty() || end >= buf.len() {
                break (end, line);
            }
            header_start = end + 1;
            header_line_no += 1;
        };
        if header_line.is_empty() {
            return Err(ProcessorError::Parse("Missing header line".into()));
        }

        let mut header_fields = Vec::new();
        split_fields(header_line, &mut header_fields);
        let headers: Vec<String> = header_fields
            .iter()
            .map(|raw| String::from_utf8_lossy(&decode_field(raw)).trim().to_string())
            .collect();

        let schema = Self::build_schema(&headers, numeric_columns)?;

        let data_start = (header_end + 1).min(buf.len());
        let data = &buf[data_start..];

        // Find chunk boundaries (split by newlines)
        let num_threads = rayon::current_num_threads().max(1);
        let chunks = Self::find_chunk_boundaries(data, num_threads);
        debug!(
            "parsing {} bytes of {} in {} chunks",
            data.len(),
            path.display(),
            chunks.len()
        );

        // Parse chunks in parallel; collect keeps file order
        let batch_results: Vec<BatchResult> = chunks
            .par_iter()
            .map(|(start, end)| {
                Self::parse_chunk(&data[*start..*end], &schema, &headers, data_start + start)
            })
            .collect();

        // Merge batch results into chunked columns
        let mut columns: Vec<Column> = schema.iter().map(|t| Column::new(*t)).collect();

        let mut total_rows = 0;
        let mut lines_before = 0;
        let mut all_errors = Vec::new();

        for mut batch in batch_results {
            total_rows += batch.row_count;

            // data starts on the line after the header
            all_errors.extend(batch.errors.drain(..).map(|mut e| {
                e.line += header_line_no + 1 + lines_before;
                e
            }));
            lines_before += batch.lines_seen;

            for (col_idx, column) in columns.iter_mut().enumerate() {
                match column {
                    Column::Float64(_) => column
                        .push_chunk_float64(std::mem::take(&mut batch.float64_batches[col_idx])),
                    Column::Str(_) => {
                        column.push_chunk_str(std::mem::take(&mut batch.str_batches[col_idx]))
                    }
                }
            }
        }

        for column in &mut columns {
            column.flatten_in_place();
        }

        if !all_errors.is_empty() {
            warn!(
                "{}: skipped {} malformed row(s), first at line {}",
                path.display(),
                all_errors.len(),
                all_errors[0].line
            );
        }

        self.mmap = Some(mmap);
        self.columns = columns;
        self.headers = headers;
        self.row_count = total_rows;

        Ok(ParseSummary {
            rows_processed: total_rows,
            errors: all_errors,
        })
    }

    fn build_schema(
        headers: &[String],
        numeric_columns: &[&str],
    ) -> Result<Vec<ColumnType>, ProcessorError> {
        if let Some(missing) = numeric_columns
            .iter()
            .find(|name| !headers.iter().any(|h| h == *name))
        {
            return Err(ProcessorError::MissingColumn(missing.to_string()));
        }

        let numeric: HashSet<&str> = numeric_columns.iter().copied().collect();
        Ok(headers
            .iter()
            .map(|h| {
                if numeric.contains(h.as_str()) {
                    ColumnType::Float64
                } else {
                    ColumnType::Str
                }
            })
            .collect())
    }

    fn find_chunk_boundaries(data: &[u8], num_chunks: usize) -> Vec<(usize, usize)> {
        if data.is_empty() {
            return vec![];
        }

        let chunk_size = data.len() / num_chunks;
        let mut boundaries = Vec::with_capacity(num_chunks);
        let mut start = 0;

        for i in 0..num_chunks - 1 {
            let mut end = ((i + 1) * chunk_size).max(start);

            // Find next newline
            match memchr(b'\n', &data[end..]) {
                Some(pos) => end += pos + 1, // Include the newline
                None => end = data.len(),
            }

            if start < end {
                boundaries.push((start, end));
            }
            start = end;
        }

        // Last chunk gets everything remaining
        if start < data.len() {
            boundaries.push((start, data.len()));
        }

        boundaries
    }

    fn parse_chunk(
        chunk: &[u8],
        schema: &[ColumnType],
        headers: &[String],
        chunk_offset: usize, // Absolute offset of this chunk in the file
    ) -> BatchResult {
        let num_cols = schema.len();
        let estimated_rows = chunk.len() / 64 + 1;

        let mut float64_cols: Vec<Vec<f64>> = schema
            .iter()
            .map(|t| match t {
                ColumnType::Float64 => Vec::with_capacity(estimated_rows),
                ColumnType::Str => Vec::new(),
            })
            .collect();

        let mut str_cols: Vec<Vec<TextCell>> = schema
            .iter()
            .map(|t| match t {
                ColumnType::Str => Vec::with_capacity(estimated_rows),
                ColumnType::Float64 => Vec::new(),
            })
            .collect();

        let mut errors = Vec::new();
        let mut row_count = 0;
        let mut fields = Vec::with_capacity(num_cols);
        let mut parsed = Vec::with_capacity(num_cols);

        let mut lines: Vec<(usize, usize)> = Vec::new();
        let mut start = 0;
        for newline_pos in memchr_iter(b'\n', chunk) {
            lines.push((start, newline_pos));
            start = newline_pos + 1;
        }
        if start < chunk.len() {
            lines.push((start, chunk.len()));
        }

        for (line_idx, &(line_start, line_end)) in lines.iter().enumerate() {
            let line = trim_cr(&chunk[line_start..line_end]);
            if line.is_empty() {
                continue;
            }

            split_fields(line, &mut fields);

            if fields.len() != num_cols {
                errors.push(ParseError {
                    line: line_idx,
                    column: String::new(),
                    value: format!("Expected {} fields, got {}", num_cols, fields.len()),
                    error: None,
                });
                continue;
            }

            // Parse numeric cells first so a bad value rejects the whole row
            parsed.clear();
            let mut rejected = false;
            for col_idx in 0..num_cols {
                if schema[col_idx] != ColumnType::Float64 {
                    continue;
                }
                match parse_number(&decode_field(fields[col_idx])) {
                    Ok(value) => parsed.push(value),
                    Err(e) => {
                        errors.push(ParseError {
                            line: line_idx,
                            column: headers[col_idx].clone(),
                            value: String::from_utf8_lossy(fields[col_idx]).to_string(),
                            error: Some(e),
                        });
                        rejected = true;
                        break;
                    }
                }
            }
            if rejected {
                continue;
            }

            let mut numbers = parsed.iter();
            for col_idx in 0..num_cols {
                match schema[col_idx] {
                    ColumnType::Float64 => {
                        if let Some(&value) = numbers.next() {
                            float64_cols[col_idx].push(value);
                        }
                    }
                    ColumnType::Str => {
                        let cell = match decode_field(fields[col_idx]) {
                            // Store absolute offset into mmap
                            Cow::Borrowed(bytes) => {
                                let field_offset_in_chunk =
                                    bytes.as_ptr() as usize - chunk.as_ptr() as usize;
                                let absolute_start = chunk_offset + field_offset_in_chunk;
                                TextCell::Span(absolute_start, absolute_start + bytes.len())
                            }
                            Cow::Owned(bytes) => {
                                TextCell::Unescaped(String::from_utf8_lossy(&bytes).into())
                            }
                        };
                        str_cols[col_idx].push(cell);
                    }
                }
            }

            row_count += 1;
        }

        BatchResult {
            float64_batches: float64_cols,
            str_batches: str_cols,
            row_count,
            lines_seen: lines.len(),
            errors,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Helper to slice mmap and return bytes for given offset
    pub fn slice_bytes(&self, start: usize, end: usize) -> Result<&[u8], ProcessorError> {
        let mmap = self.mmap.as_ref().ok_or(ProcessorError::MmapNotLoaded)?;

        if end > mmap.len() || start > end {
            return Err(ProcessorError::Parse("Invalid byte range".into()));
        }

        Ok(&mmap[start..end])
    }

    /// Decoded text for an offset pair; invalid UTF-8 is replaced, not rejected
    pub fn get_string(&self, start: usize, end: usize) -> Result<Cow<'_, str>, ProcessorError> {
        Ok(String::from_utf8_lossy(self.slice_bytes(start, end)?))
    }

    /// Text of one cell of a text column
    pub fn cell_text<'a>(&'a self, cell: &'a TextCell) -> Result<Cow<'a, str>, ProcessorError> {
        match cell {
            TextCell::Span(start, end) => self.get_string(*start, *end),
            TextCell::Unescaped(text) => Ok(Cow::Borrowed(&**text)),
        }
    }

    pub fn get_col(&self, col_name: &str) -> Result<&Column, ProcessorError> {
        let col_pos = self
            .headers
            .iter()
            .position(|cn| cn == col_name)
            .ok_or_else(|| ProcessorError::MissingColumn(col_name.to_string()))?;

        self.columns
            .get(col_pos)
            .ok_or_else(|| ProcessorError::MissingColumn(col_name.to_string()))
    }

    /// All values of a numeric column, in row order
    pub fn numeric_values(&self, col_name: &str) -> Result<&[f64], ProcessorError> {
        let col = self.get_col(col_name)?;
        if col.column_type() != ColumnType::Float64 {
            return Err(ProcessorError::TypeMismatch {
                column: col_name.to_string(),
                expected: ColumnType::Float64.name(),
            });
        }
        col.as_f64_slice()
    }

    /// All values of a text column, in row order
    pub fn text_values(&self, col_name: &str) -> Result<Vec<Cow<'_, str>>, ProcessorError> {
        let col = self.get_col(col_name)?;
        if col.column_type() != ColumnType::Str {
            return Err(ProcessorError::TypeMismatch {
                column: col_name.to_string(),
                expected: ColumnType::Str.name(),
            });
        }
        col.as_text_cells()?
            .iter()
            .map(|cell| self.cell_text(cell))
            .collect()
    }

    /// Display form of one cell, for previews
    pub fn cell_display(&self, col_idx: usize, row: usize) -> Result<String, ProcessorError> {
        let col = self
            .columns
            .get(col_idx)
            .ok_or_else(|| ProcessorError::MissingColumn(format!("#{col_idx}")))?;
        match col {
            Column::Float64(_) => {
                let v = col
                    .as_f64_slice()?
                    .get(row)
                    .copied()
                    .ok_or_else(|| ProcessorError::Parse(format!("row {row} out of range")))?;
                Ok(if v.is_nan() { "NaN".to_string() } else { v.to_string() })
            }
            Column::Str(_) => {
                let cell = col
                    .as_text_cells()?
                    .get(row)
                    .ok_or_else(|| ProcessorError::Parse(format!("row {row} out of range")))?;
                Ok(self.cell_text(cell)?.into_owned())
            }
        }
    }

    /// Rows (over the whole table) where `column` matches `predicate`
    pub fn filter(
        &self,
        column: &str,
        predicate: &FilterPredicate,
    ) -> Result<Vec<usize>, ProcessorError> {
        let all: Vec<usize> = (0..self.row_count).collect();
        self.filter_rows(&all, column, predicate)
    }

    /// Subset of `rows` where `column` matches `predicate`, order preserved
    pub fn filter_rows(
        &self,
        rows: &[usize],
        column: &str,
        predicate: &FilterPredicate,
    ) -> Result<Vec<usize>, ProcessorError> {
        let col = self.get_col(column)?;

        match (col, predicate) {
            (Column::Float64(_), FilterPredicate::GreaterThan(threshold)) => {
                let values = col.as_f64_slice()?;
                let gathered = rows
                    .iter()
                    .map(|&r| {
                        values
                            .get(r)
                            .copied()
                            .ok_or_else(|| ProcessorError::Parse(format!("row {r} out of range")))
                    })
                    .collect::<Result<Vec<f64>, _>>()?;
                Ok(filter_gt_f64(&gathered, *threshold)
                    .into_iter()
                    .map(|i| rows[i])
                    .collect())
            }

            (Column::Str(_), FilterPredicate::Equals(target)) => {
                let cells = col.as_text_cells()?;
                let mut out = Vec::with_capacity(rows.len());
                for &r in rows {
                    let cell = cells
                        .get(r)
                        .ok_or_else(|| ProcessorError::Parse(format!("row {r} out of range")))?;
                    if self.cell_text(cell)? == target.as_str() {
                        out.push(r);
                    }
                }
                Ok(out)
            }

            (Column::Float64(_), FilterPredicate::Equals(_)) => Err(ProcessorError::TypeMismatch {
                column: column.to_string(),
                expected: ColumnType::Str.name(),
            }),
            (Column::Str(_), FilterPredicate::GreaterThan(_)) => {
                Err(ProcessorError::TypeMismatch {
                    column: column.to_string(),
                    expected: ColumnType::Float64.name(),
                })
            }
        }
    }

    /// Group `rows` by the text columns in `group_cols` and aggregate `agg_col`.
    ///
    /// Rows with an empty key are left out. Groups come back sorted by key and
    /// `values[i]` is the result of `ops[i]`.
    pub fn group_by(
        &self,
        rows: &[usize],
        group_cols: &[&str],
        agg_col: &str,
        ops: &[AggregateOp],
    ) -> Result<Vec<GroupedAggregate>, ProcessorError> {
        let keys = group_cols
            .iter()
            .map(|c| self.text_values(c))
            .collect::<Result<Vec<_>, _>>()?;
        let values = self.numeric_values(agg_col)?;

        let mut groups: BTreeMap<Vec<String>, Vec<f64>> = BTreeMap::new();
        for &r in rows {
            let Some(&value) = values.get(r) else {
                return Err(ProcessorError::Parse(format!("row {r} out of range")));
            };
            let key: Vec<String> = keys.iter().map(|k| k[r].to_string()).collect();
            if key.iter().any(|k| k.is_empty()) {
                continue;
            }
            groups.entry(key).or_default().push(value);
        }

        Ok(groups
            .into_iter()
            .map(|(keys, group_values)| GroupedAggregate {
                rows: group_values.len(),
                values: ops
                    .iter()
                    .map(|op| aggregate_values(&group_values, *op))
                    .collect(),
                keys,
            })
            .collect())
    }
}

impl Default for ColumnarTable {
    fn default() -> Self {
        Self::new()
    }
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Split one CSV line on commas. Double quotes protect commas; the returned
/// slices are raw, see [`decode_field`].
fn split_fields<'a>(line: &'a [u8], fields: &mut Vec<&'a [u8]>) {
    fields.clear();

    if memchr(b'"', line).is_none() {
        let mut field_start = 0;
        for comma_pos in memchr_iter(b',', line) {
            fields.push(&line[field_start..comma_pos]);
            field_start = comma_pos + 1;
        }
        fields.push(&line[field_start..]);
        return;
    }

    let mut in_quotes = false;
    let mut field_start = 0;
    for (i, &b) in line.iter().enumerate() {
        match b {
            b'"' => in_quotes = !in_quotes,
            b',' if !in_quotes => {
                fields.push(&line[field_start..i]);
                field_start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&line[field_start..]);
}

/// Field contents without the surrounding quotes. Inside a quoted field a
/// doubled quote stands for one quote, which needs an owned copy.
fn decode_field(raw: &[u8]) -> Cow<'_, [u8]> {
    match raw {
        [b'"', inner @ .., b'"'] if memmem::find(inner, b"\"\"").is_some() => {
            let mut out = Vec::with_capacity(inner.len());
            let mut i = 0;
            while i < inner.len() {
                out.push(inner[i]);
                i += if inner[i] == b'"' && inner.get(i + 1) == Some(&b'"') { 2 } else { 1 };
            }
            Cow::Owned(out)
        }
        [b'"', inner @ .., b'"'] => Cow::Borrowed(inner),
        _ => Cow::Borrowed(raw),
    }
}

fn parse_number(field: &[u8]) -> Result<f64, String> {
    let trimmed = field.trim_ascii();
    if trimmed.is_empty() {
        return Ok(f64::NAN);
    }
    fast_float::parse::<f64, _>(trimmed).map_err(|e| e.to_string())
}
