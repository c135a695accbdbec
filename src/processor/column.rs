use crate::processor::ProcessorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Float64,
    Str,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Float64 => "numeric",
            ColumnType::Str => "text",
        }
    }
}

/// One text cell. Most cells point straight into the mapped file; a quoted
/// field with doubled quotes is unescaped and kept as owned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextCell {
    /// Absolute byte range into the mmap
    Span(usize, usize),
    Unescaped(Box<str>),
}

#[derive(Debug, Clone)]
pub enum Column {
    Float64(Vec<Vec<f64>>),
    Str(Vec<Vec<TextCell>>),
}

impl Column {
    pub fn new(col_type: ColumnType) -> Self {
        match col_type {
            ColumnType::Float64 => Column::Float64(Vec::new()),
            ColumnType::Str => Column::Str(Vec::new()),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Float64(_) => ColumnType::Float64,
            Column::Str(_) => ColumnType::Str,
        }
    }

    pub fn push_chunk_float64(&mut self, chunk: Vec<f64>) {
        if let Column::Float64(chunks) = self {
            chunks.push(chunk)
        }
    }

    pub fn push_chunk_str(&mut self, chunk: Vec<TextCell>) {
        if let Column::Str(chunks) = self {
            chunks.push(chunk)
        }
    }

    /// Contiguous view of a flattened numeric column
    pub fn as_f64_slice(&self) -> Result<&[f64], ProcessorError> {
        match self {
            Column::Float64(chunks) => match chunks.as_slice() {
                [] => Ok(&[]),
                [single] => Ok(single),
                _ => Err(ProcessorError::Parse("column is not flattened".into())),
            },
            Column::Str(_) => Err(ProcessorError::Parse("expected numeric column".into())),
        }
    }

    /// Contiguous view of a flattened text column's cells
    pub fn as_text_cells(&self) -> Result<&[TextCell], ProcessorError> {
        match self {
            Column::Str(chunks) => match chunks.as_slice() {
                [] => Ok(&[]),
                [single] => Ok(single),
                _ => Err(ProcessorError::Parse("column is not flattened".into())),
            },
            Column::Float64(_) => Err(ProcessorError::Parse("expected text column".into())),
        }
    }

    pub fn flatten_in_place(&mut self) {
        match self {
            Column::Float64(chunks) => flatten_chunks(chunks),
            Column::Str(chunks) => flatten_chunks(chunks),
        }
    }
}

fn flatten_chunks<T>(chunks: &mut Vec<Vec<T>>) {
    if chunks.len() <= 1 {
        return; // Already flat
    }

    // Take ownership of chunks, leaving empty vec
    let mut owned_chunks = std::mem::take(chunks);

    // Use the first chunk as the base (it's already allocated)
    let mut flattened = owned_chunks.remove(0);
    let total: usize = owned_chunks.iter().map(|c| c.len()).sum();
    flattened.reserve(total);

    for chunk in owned_chunks {
        flattened.extend(chunk);
    }

    chunks.push(flattened);
}
