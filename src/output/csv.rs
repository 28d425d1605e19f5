use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};

use super::{VectorRow, VectorWriter};
use crate::data::SparseVector;

/// CSV layout: header `key,cardinality,indices,values`; the `indices` and
/// `values` cells hold semicolon-separated lists of equal length, e.g.
/// `"3;7"` and `"0.5;2"`.
pub struct CsvVectorWriter {
    out: ::csv::Writer<File>,
}

impl CsvVectorWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let mut out = ::csv::Writer::from_path(path)
            .with_context(|| format!("creating CSV file {}", path.display()))?;
        out.write_record(["key", "cardinality", "indices", "values"])
            .context("writing CSV header")?;
        Ok(CsvVectorWriter { out })
    }
}

fn join_semicolon<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

impl VectorWriter for CsvVectorWriter {
    fn write_vector(&mut self, key: u64, vector: &SparseVector) -> Result<()> {
        let row = VectorRow::new(key, vector);
        self.out.write_record([
            row.key.to_string(),
            row.cardinality.to_string(),
            join_semicolon(&row.indices),
            join_semicolon(&row.values),
        ])?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.out.flush().context("flushing CSV file")?;
        Ok(())
    }
}
