//! Data layer: LIBSVM records in, sparse vectors out.
//!
//! Architecture:
//! ```text
//!   file / string / reader
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │ RecordReader  │  skip blank + comment lines, track line numbers
//!   └──────────────┘
//!        │  trimmed line
//!        ▼
//!   ┌──────────┐
//!   │ decoder   │  line → (Label, SparseVector)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────────┐
//!   │ LibsvmVectors  │  vectors out, labels → caller's Vec<f64>
//!   └───────────────┘
//! ```

pub mod decoder;
pub mod error;
pub mod model;
pub mod reader;

pub use decoder::{decode_line, decode_record};
pub use error::{LibsvmError, RecordErrorKind, RecordParseError, Result};
pub use model::{Label, Record, SparseVector, CARDINALITY, NO_LABEL};
pub use reader::{LibsvmVectors, ReadErrorHook, RecordReader};
