use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use super::{VectorRow, VectorWriter};
use crate::data::SparseVector;

/// JSON lines: one [`VectorRow`] object per line.
pub struct JsonVectorWriter {
    out: BufWriter<File>,
}

impl JsonVectorWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("creating JSON file {}", path.display()))?;
        Ok(JsonVectorWriter {
            out: BufWriter::new(file),
        })
    }
}

impl VectorWriter for JsonVectorWriter {
    fn write_vector(&mut self, key: u64, vector: &SparseVector) -> Result<()> {
        serde_json::to_writer(&mut self.out, &VectorRow::new(key, vector))?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.out.flush().context("flushing JSON file")?;
        Ok(())
    }
}
