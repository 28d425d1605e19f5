//! Per-line LIBSVM decoding.
//!
//! Accepted variants besides the plain `label index:value ...` layout:
//! inline trailing comments, records without a label, a leading `+` on the
//! label, and the `3: .5` spacing produced by some Matlab exporters.

use super::error::{RecordErrorKind, RecordParseError};
use super::model::{Label, Record, SparseVector, CARDINALITY};

/// Decode `line` into `row` and return its label.
///
/// `line` is expected to be trimmed. A line that starts with `marker`
/// decodes to label `0` and leaves `row` untouched, even though the stream
/// reader never hands such lines over.
pub fn decode_record(
    line: &str,
    marker: char,
    row: &mut SparseVector,
) -> Result<Label, RecordParseError> {
    if line.starts_with(marker) {
        return Ok(Label::Value(0.0));
    }

    let parts = split_dropping_trailing(line, marker);
    let content = if parts.len() == 2 { parts[0] } else { line };

    let repaired = content.replace(": .", ":0.");
    // Empty tokens from leading or repeated separators are dropped here.
    let mut tokens = repaired
        .split(is_separator)
        .filter(|token| !token.is_empty());

    let first = tokens
        .next()
        .ok_or_else(|| RecordParseError::new(line, RecordErrorKind::EmptyRecord))?;

    let label = match classify_first_token(first) {
        FirstToken::Label(text) => Label::Value(text.parse::<f64>().map_err(|_| {
            RecordParseError::new(line, RecordErrorKind::InvalidLabel(first.to_string()))
        })?),
        FirstToken::Feature => {
            set_feature(first, row).map_err(|kind| RecordParseError::new(line, kind))?;
            Label::Missing
        }
    };

    for token in tokens {
        set_feature(token, row).map_err(|kind| RecordParseError::new(line, kind))?;
    }

    Ok(label)
}

/// Convenience wrapper returning a fresh [`Record`].
pub fn decode_line(line: &str, marker: char) -> Result<Record, RecordParseError> {
    let mut vector = SparseVector::new();
    let label = decode_record(line, marker, &mut vector)?;
    Ok(Record { label, vector })
}

/// ASCII whitespace only; other Unicode spaces stay part of a token.
fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

enum FirstToken {
    /// Bare number, `+` and spaces already stripped.
    Label(String),
    /// Contains `:`, so it is the record's first `index:value` pair.
    Feature,
}

fn classify_first_token(token: &str) -> FirstToken {
    let cleaned: String = token.chars().filter(|&c| c != '+' && c != ' ').collect();
    let parts = split_dropping_trailing(&cleaned, ':');
    if parts.len() == 1 {
        FirstToken::Label(parts[0].to_string())
    } else {
        FirstToken::Feature
    }
}

fn set_feature(token: &str, row: &mut SparseVector) -> Result<(), RecordErrorKind> {
    let parts = split_dropping_trailing(token, ':');
    let index_text = parts
        .first()
        .copied()
        .ok_or_else(|| RecordErrorKind::InvalidIndex(token.to_string()))?;

    let index: usize = index_text
        .parse()
        .map_err(|_| RecordErrorKind::InvalidIndex(index_text.to_string()))?;
    if index >= CARDINALITY {
        return Err(RecordErrorKind::IndexOutOfRange(index));
    }

    let value = parts
        .get(1)
        .copied()
        .ok_or_else(|| RecordErrorKind::MissingValue(token.to_string()))?;
    let value: f64 = value
        .parse()
        .map_err(|_| RecordErrorKind::InvalidValue(value.to_string()))?;

    row.set(index, value);
    Ok(())
}

/// Split on `sep` and drop empty trailing parts, so `"3:"` is one part and
/// `"a # "` followed by nothing is treated as a single segment.
fn split_dropping_trailing(s: &str, sep: char) -> Vec<&str> {
    let mut parts: Vec<&str> = s.split(sep).collect();
    while parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    // A string made only of separators has no parts at all.
    if parts.len() == 1 && parts[0].is_empty() && !s.is_empty() {
        parts.pop();
    }
    parts
}
