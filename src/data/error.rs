use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a single record could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordErrorKind {
    #[error("record has no tokens")]
    EmptyRecord,
    #[error("'{0}' is not a valid label")]
    InvalidLabel(String),
    #[error("'{0}' is not a valid feature index")]
    InvalidIndex(String),
    #[error("feature index {0} exceeds the vector cardinality")]
    IndexOutOfRange(usize),
    #[error("feature '{0}' has no ':value' part")]
    MissingValue(String),
    #[error("'{0}' is not a valid feature value")]
    InvalidValue(String),
}

/// A malformed LIBSVM line, with enough context to find it in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordParseError {
    pub line: String,
    /// 1-based physical line number, when the line came from a stream.
    pub line_number: Option<usize>,
    pub kind: RecordErrorKind,
}

impl RecordParseError {
    pub fn new(line: &str, kind: RecordErrorKind) -> Self {
        Self {
            line: line.to_string(),
            line_number: None,
            kind,
        }
    }

    pub fn at_line(mut self, line_number: usize) -> Self {
        self.line_number = Some(line_number);
        self
    }
}

impl fmt::Display for RecordParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_number {
            Some(n) => write!(f, "line {n}: {} in {:?}", self.kind, self.line),
            None => write!(f, "{} in {:?}", self.kind, self.line),
        }
    }
}

impl std::error::Error for RecordParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Errors surfaced by the vector sequence.
///
/// Read failures while advancing are not in here: they end the sequence
/// quietly (see [`crate::data::reader`]).
#[derive(Debug, Error)]
pub enum LibsvmError {
    #[error("cannot open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    RecordParse(#[from] RecordParseError),
    #[error("no more vectors in the sequence")]
    Exhausted,
    #[error("remove is not supported by the vector sequence")]
    Unsupported,
}

pub type Result<T> = std::result::Result<T, LibsvmError>;
