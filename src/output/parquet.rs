use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Builder, Int64Array, Int64Builder, ListBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use ::parquet::arrow::ArrowWriter;

use super::{VectorRow, VectorWriter};
use crate::data::SparseVector;

/// Rows buffered before a record batch is handed to the Parquet writer.
const BATCH_ROWS: usize = 1024;

/// Parquet container with schema:
/// - `key`: Int64
/// - `cardinality`: Int64
/// - `indices`: List<Int64>
/// - `values`: List<Float64>
pub struct ParquetVectorWriter {
    schema: SchemaRef,
    writer: ArrowWriter<File>,
    pending: Vec<VectorRow>,
}

fn list_of(item: DataType) -> DataType {
    DataType::List(Arc::new(Field::new("item", item, true)))
}

pub fn vector_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("key", DataType::Int64, false),
        Field::new("cardinality", DataType::Int64, false),
        Field::new("indices", list_of(DataType::Int64), false),
        Field::new("values", list_of(DataType::Float64), false),
    ]))
}

impl ParquetVectorWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("creating parquet file {}", path.display()))?;
        let schema = vector_schema();
        let writer = ArrowWriter::try_new(file, schema.clone(), None)
            .context("creating parquet writer")?;
        Ok(ParquetVectorWriter {
            schema,
            writer,
            pending: Vec::with_capacity(BATCH_ROWS),
        })
    }

    fn flush_batch(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let keys = Int64Array::from(self.pending.iter().map(|r| r.key as i64).collect::<Vec<_>>());
        let cardinalities = Int64Array::from(
            self.pending
                .iter()
                .map(|r| r.cardinality as i64)
                .collect::<Vec<_>>(),
        );

        let mut indices = ListBuilder::new(Int64Builder::new());
        let mut values = ListBuilder::new(Float64Builder::new());
        for row in &self.pending {
            let idx = indices.values();
            for &i in &row.indices {
                idx.append_value(i as i64);
            }
            indices.append(true);

            let vals = values.values();
            for &v in &row.values {
                vals.append_value(v);
            }
            values.append(true);
        }

        let batch = RecordBatch::try_new(
            self.schema.clone(),
            vec![
                Arc::new(keys) as ArrayRef,
                Arc::new(cardinalities) as ArrayRef,
                Arc::new(indices.finish()) as ArrayRef,
                Arc::new(values.finish()) as ArrayRef,
            ],
        )
        .context("building record batch")?;

        self.writer.write(&batch).context("writing record batch")?;
        self.pending.clear();
        Ok(())
    }
}

impl VectorWriter for ParquetVectorWriter {
    fn write_vector(&mut self, key: u64, vector: &SparseVector) -> Result<()> {
        self.pending.push(VectorRow::new(key, vector));
        if self.pending.len() >= BATCH_ROWS {
            self.flush_batch()?;
        }
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.flush_batch()?;
        self.writer.close().context("closing parquet writer")?;
        Ok(())
    }
}
