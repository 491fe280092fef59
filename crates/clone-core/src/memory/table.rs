//! ============================================================================
//! Memory Table - CSV loader for stored memories
//! ============================================================================
//! Expected layout: a header row with a `text` (or `content`) column, an
//! optional `embedding` column holding `[f, f, ...]`, and an optional `id`
//! column. A leading unnamed column (a dataframe index) is used as the id.
//! ============================================================================

use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

use super::types::{MemoryRecord, TableStats};
use crate::error::MemoryLoadError;

const TEXT_COLUMNS: &[&str] = &["text", "content"];
const EMBEDDING_COLUMNS: &[&str] = &["embedding", "embeddings"];
const ID_COLUMNS: &[&str] = &["id", "", "Unnamed: 0"];

/// Ordered, read-only collection of memory records
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    records: Vec<MemoryRecord>,
}

impl MemoryTable {
    pub fn new(records: Vec<MemoryRecord>) -> Self {
        Self { records }
    }

    /// Load the table from a CSV file
    pub fn load(path: &Path) -> Result<Self, MemoryLoadError> {
        info!("Loading memory table from {}", path.display());

        let file = File::open(path).map_err(|source| MemoryLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let table = Self::from_reader(file, path)?;
        let stats = table.stats();
        info!(
            "Loaded {} memories ({} with embeddings)",
            stats.total, stats.embedded
        );
        Ok(table)
    }

    /// Parse CSV from any reader; `source` is only used for error reporting
    pub fn from_reader<R: std::io::Read>(reader: R, source: &Path) -> Result<Self, MemoryLoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let find_column = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
        };

        let text_col = find_column(TEXT_COLUMNS).ok_or_else(|| MemoryLoadError::MissingTextColumn {
            path: source.to_path_buf(),
        })?;
        let embedding_col = find_column(EMBEDDING_COLUMNS);
        let id_col = find_column(ID_COLUMNS).filter(|c| *c != text_col);

        debug!(
            "Memory table columns: text={}, embedding={:?}, id={:?}",
            text_col, embedding_col, id_col
        );

        let mut records = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let row_data = result?;

            let text = row_data.get(text_col).unwrap_or_default().trim();
            if text.is_empty() {
                debug!("Skipping row {} with empty text", row);
                continue;
            }

            let id = id_col
                .and_then(|c| row_data.get(c))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| row.to_string());

            let embedding = match embedding_col.and_then(|c| row_data.get(c)) {
                Some(cell) => parse_embedding(cell, row)?,
                None => Vec::new(),
            };

            records.push(MemoryRecord::new(id, text).with_embedding(embedding));
        }

        let table = Self { records };
        table.warn_on_mixed_dimensions();
        Ok(table)
    }

    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records whose embedding has exactly `dimension` components
    pub fn count_with_dimension(&self, dimension: usize) -> usize {
        self.records
            .iter()
            .filter(|r| r.has_embedding() && r.embedding.len() == dimension)
            .count()
    }

    pub fn stats(&self) -> TableStats {
        let embedded: Vec<_> = self.records.iter().filter(|r| r.has_embedding()).collect();
        TableStats {
            total: self.records.len(),
            embedded: embedded.len(),
            dimension: embedded.first().map(|r| r.embedding.len()),
        }
    }

    fn warn_on_mixed_dimensions(&self) {
        let mut dims = self
            .records
            .iter()
            .filter(|r| r.has_embedding())
            .map(|r| r.embedding.len());
        if let Some(first) = dims.next() {
            if dims.any(|d| d != first) {
                warn!("Memory table has embeddings of differing dimensions; mismatched rows are never retrieved");
            }
        }
    }
}

/// Parse an embedding cell such as `[0.12, -0.5, 3e-4]`. Empty cells mean no embedding.
fn parse_embedding(cell: &str, row: usize) -> Result<Vec<f32>, MemoryLoadError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(Vec::new());
    }

    let embedding = serde_json::from_str::<Vec<f32>>(cell).map_err(|e| {
        MemoryLoadError::InvalidEmbedding {
            row,
            reason: e.to_string(),
        }
    })?;

    // Values beyond f32 range come back as infinities
    if let Some(pos) = embedding.iter().position(|v| !v.is_finite()) {
        return Err(MemoryLoadError::InvalidEmbedding {
            row,
            reason: format!("component {} is not a finite f32", pos),
        });
    }

    Ok(embedding)
}
