//! Streaming LIBSVM parsing and conversion to sparse vector files.

pub mod config;
pub mod data;
pub mod driver;
pub mod output;

pub use config::{Encoding, ErrorPolicy, ParserOptions};
pub use data::{Label, LibsvmError, LibsvmVectors, Record, RecordReader, SparseVector};
