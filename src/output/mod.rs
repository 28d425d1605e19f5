//! Output layer: persist a vector sequence.
//!
//! Every writer stores the same row layout:
//! `key`, `cardinality`, `indices`, `values` (entries in ascending index
//! order). Labels are not part of the row; they go to the dictionary file.

pub mod csv;
pub mod json;
pub mod parquet;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{self, SparseVector};

// ---------------------------------------------------------------------------
// Writer trait + shared row shape
// ---------------------------------------------------------------------------

/// Sink for parsed vectors.
pub trait VectorWriter {
    fn write_vector(&mut self, key: u64, vector: &SparseVector) -> Result<()>;

    /// Flush and close the underlying file.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// One serialized vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRow {
    pub key: u64,
    pub cardinality: u64,
    pub indices: Vec<u64>,
    pub values: Vec<f64>,
}

impl VectorRow {
    pub fn new(key: u64, vector: &SparseVector) -> Self {
        let (indices, values) = vector
            .sorted_entries()
            .into_iter()
            .map(|(i, v)| (i as u64, v))
            .unzip();
        VectorRow {
            key,
            cardinality: vector.cardinality() as u64,
            indices,
            values,
        }
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Parquet container, one row per vector.
    #[default]
    Parquet,
    /// JSON lines.
    Json,
    /// CSV with semicolon-separated index/value cells.
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Json => "jsonl",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Open a writer of the given format at `path`, truncating any existing file.
pub fn create_writer(format: OutputFormat, path: &Path) -> Result<Box<dyn VectorWriter>> {
    let writer: Box<dyn VectorWriter> = match format {
        OutputFormat::Parquet => Box::new(parquet::ParquetVectorWriter::create(path)?),
        OutputFormat::Json => Box::new(json::JsonVectorWriter::create(path)?),
        OutputFormat::Csv => Box::new(csv::CsvVectorWriter::create(path)?),
    };
    Ok(writer)
}

/// Pull vectors into `writer` until the sequence ends or `max` are written.
///
/// Stops before requesting vector `max + 1`, so a label list fed by the same
/// sequence stays aligned with what was written. Returns the number written.
pub fn write_vectors<I>(writer: &mut dyn VectorWriter, vectors: I, max: Option<u64>) -> Result<u64>
where
    I: IntoIterator<Item = data::Result<SparseVector>>,
{
    let mut vectors = vectors.into_iter();
    let mut written = 0u64;

    while max.map_or(true, |m| written < m) {
        let Some(next) = vectors.next() else {
            break;
        };
        let vector = next.with_context(|| format!("reading vector {written}"))?;
        writer
            .write_vector(written, &vector)
            .with_context(|| format!("writing vector {written}"))?;
        written += 1;
    }

    Ok(written)
}
