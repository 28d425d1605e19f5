use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Parser configuration
// ---------------------------------------------------------------------------

/// Marker that starts a comment line or an inline trailing comment.
pub const DEFAULT_COMMENT_MARKER: char = '#';

/// Character encoding of the LIBSVM source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8; invalid sequences become U+FFFD instead of failing the read.
    #[default]
    Utf8,
    /// ISO-8859-1: every byte maps to the code point with the same value.
    Latin1,
}

impl Encoding {
    /// Decode one raw line (without its terminator).
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Encoding::Latin1),
            other => Err(format!("unknown encoding '{other}' (expected utf8 or latin1)")),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "utf8"),
            Encoding::Latin1 => write!(f, "latin1"),
        }
    }
}

/// What the vector sequence does with a line that fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Return the error from the step that hit it, then stop the sequence.
    #[default]
    Abort,
    /// Log the line and continue with the next one.
    Skip,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(ErrorPolicy::Abort),
            "skip" => Ok(ErrorPolicy::Skip),
            other => Err(format!("unknown error policy '{other}' (expected abort or skip)")),
        }
    }
}

/// Settings shared by every sequence built from one conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    pub comment_marker: char,
    pub encoding: Encoding,
    pub error_policy: ErrorPolicy,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            comment_marker: DEFAULT_COMMENT_MARKER,
            encoding: Encoding::default(),
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl ParserOptions {
    pub fn with_comment_marker(mut self, marker: char) -> Self {
        self.comment_marker = marker;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }
}
