use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::Path;

use super::decoder::decode_line;
use super::error::{LibsvmError, RecordParseError, Result};
use super::model::{Record, SparseVector};
use crate::config::{Encoding, ErrorPolicy, ParserOptions};

/// Called with the I/O error that ended a sequence early.
pub type ReadErrorHook = Box<dyn FnMut(&io::Error)>;

// ---------------------------------------------------------------------------
// RecordReader – classifier + decoder over one source
// ---------------------------------------------------------------------------

/// Single-pass reader yielding one [`Record`] per data line.
///
/// Blank lines and lines starting with the comment marker are skipped. A
/// read failure is treated as end of input: it is logged and handed to the
/// optional hook but never returned to the caller. The source is dropped as
/// soon as the reader runs out of lines.
pub struct RecordReader<R> {
    source: Option<R>,
    options: ParserOptions,
    line_number: usize,
    buf: Vec<u8>,
    /// Next item to hand out; `None` once exhausted.
    current: Option<std::result::Result<Record, RecordParseError>>,
    on_read_error: Option<ReadErrorHook>,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(source: R, options: ParserOptions) -> Self {
        Self::build(source, options, None)
    }

    pub fn with_read_error_hook(
        source: R,
        options: ParserOptions,
        hook: impl FnMut(&io::Error) + 'static,
    ) -> Self {
        Self::build(source, options, Some(Box::new(hook)))
    }

    fn build(source: R, options: ParserOptions, on_read_error: Option<ReadErrorHook>) -> Self {
        let mut reader = RecordReader {
            source: Some(source),
            options,
            line_number: 0,
            buf: Vec::new(),
            current: None,
            on_read_error,
        };
        reader.advance();
        reader
    }

    pub fn has_next(&self) -> bool {
        self.current.is_some()
    }

    /// Hand out the current record and move to the next one.
    ///
    /// Under [`ErrorPolicy::Abort`] a malformed line is returned as
    /// [`LibsvmError::RecordParse`] and the reader is exhausted afterwards.
    pub fn next_record(&mut self) -> Result<Record> {
        match self.current.take() {
            None => Err(LibsvmError::Exhausted),
            Some(Ok(record)) => {
                self.advance();
                Ok(record)
            }
            Some(Err(err)) => {
                self.close();
                Err(err.into())
            }
        }
    }

    /// Removing elements is not supported; always fails.
    pub fn remove(&mut self) -> Result<()> {
        Err(LibsvmError::Unsupported)
    }

    /// Load the next decodable record (or the first bad one under `Abort`).
    fn advance(&mut self) {
        self.current = None;
        let marker = self.options.comment_marker;

        while let Some((number, line)) = self.next_eligible_line() {
            match decode_line(&line, marker) {
                Ok(record) => {
                    self.current = Some(Ok(record));
                    return;
                }
                Err(err) => {
                    let err = err.at_line(number);
                    match self.options.error_policy {
                        ErrorPolicy::Abort => {
                            self.current = Some(Err(err));
                            return;
                        }
                        ErrorPolicy::Skip => {
                            log::warn!("Skipping malformed record: {err}");
                        }
                    }
                }
            }
        }
    }

    /// Next trimmed line that is neither blank nor a comment.
    fn next_eligible_line(&mut self) -> Option<(usize, String)> {
        let marker = self.options.comment_marker;
        let source = self.source.as_mut()?;

        loop {
            self.buf.clear();
            match read_line_bytes(source, &mut self.buf) {
                Ok(0) => break,
                Ok(_) => {
                    self.line_number += 1;
                    let text = self.options.encoding.decode(&self.buf);
                    let line = text.trim_matches(is_trimmed);
                    if !line.is_empty() && !line.starts_with(marker) {
                        return Some((self.line_number, line.to_string()));
                    }
                }
                Err(e) => {
                    log::warn!(
                        "Read failed after line {}, ending sequence: {e}",
                        self.line_number
                    );
                    if let Some(hook) = self.on_read_error.as_mut() {
                        hook(&e);
                    }
                    break;
                }
            }
        }

        self.close();
        None
    }

    /// Drop the source. Safe to call repeatedly.
    fn close(&mut self) {
        if let Some(source) = self.source.take() {
            log::debug!("Source exhausted after {} lines", self.line_number);
            drop(source);
        }
    }
}

/// Control characters and space are trimmed from both ends of a line, so a
/// trailing `\0` or Ctrl-Z byte leaves an empty line behind.
fn is_trimmed(c: char) -> bool {
    c <= ' '
}

/// Read one line terminated by `\n`, `\r` or `\r\n` into `buf`, without the
/// terminator. Returns the number of bytes consumed, 0 at end of input.
fn read_line_bytes<R: BufRead>(source: &mut R, buf: &mut Vec<u8>) -> io::Result<usize> {
    let mut consumed = 0;
    loop {
        let available = match source.fill_buf() {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return Ok(consumed);
        }

        match available.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(end) => {
                let carriage_return = available[end] == b'\r';
                buf.extend_from_slice(&available[..end]);
                source.consume(end + 1);
                consumed += end + 1;
                if carriage_return {
                    consumed += skip_line_feed(source);
                }
                return Ok(consumed);
            }
            None => {
                let len = available.len();
                buf.extend_from_slice(available);
                source.consume(len);
                consumed += len;
            }
        }
    }
}

/// Consume the `\n` of a `\r\n` pair. A read error here is left for the next
/// line read to report, since the current line is already complete.
fn skip_line_feed<R: BufRead>(source: &mut R) -> usize {
    loop {
        match source.fill_buf() {
            Ok(bytes) if bytes.first() == Some(&b'\n') => {
                source.consume(1);
                return 1;
            }
            Ok(_) => return 0,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return 0,
        }
    }
}

impl<T: Read> RecordReader<BufReader<T>> {
    pub fn from_read(source: T, options: ParserOptions) -> Self {
        Self::new(BufReader::new(source), options)
    }
}

impl RecordReader<BufReader<File>> {
    pub fn from_path(path: &Path, options: ParserOptions) -> Result<Self> {
        let file = File::open(path).map_err(|source| LibsvmError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_read(file, options))
    }
}

impl RecordReader<Cursor<String>> {
    /// Parse in-memory text. The text is already decoded, so the configured
    /// encoding is replaced with UTF-8.
    pub fn from_text(text: impl Into<String>, options: ParserOptions) -> Self {
        Self::new(
            Cursor::new(text.into()),
            options.with_encoding(Encoding::Utf8),
        )
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            Some(self.next_record())
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// LibsvmVectors – vectors out, labels into a caller-owned list
// ---------------------------------------------------------------------------

/// Lazy vector sequence whose labels are appended to a list the caller
/// owns, one per emitted vector and in the same order.
pub struct LibsvmVectors<'l, R> {
    records: RecordReader<R>,
    labels: &'l mut Vec<f64>,
}

impl<'l, R: BufRead> LibsvmVectors<'l, R> {
    pub fn new(source: R, labels: &'l mut Vec<f64>, options: ParserOptions) -> Self {
        Self::from_records(RecordReader::new(source, options), labels)
    }

    pub fn from_records(records: RecordReader<R>, labels: &'l mut Vec<f64>) -> Self {
        Self { records, labels }
    }

    pub fn has_next(&self) -> bool {
        self.records.has_next()
    }

    /// Next vector; its label is pushed onto the label list first.
    pub fn next_vector(&mut self) -> Result<SparseVector> {
        let record = self.records.next_record()?;
        self.labels.push(record.label.as_f64());
        Ok(record.vector)
    }

    pub fn remove(&mut self) -> Result<()> {
        self.records.remove()
    }

    /// Labels collected so far, including those from earlier sequences that
    /// shared the list.
    pub fn labels(&self) -> &[f64] {
        self.labels
    }
}

impl<'l, T: Read> LibsvmVectors<'l, BufReader<T>> {
    pub fn from_read(source: T, labels: &'l mut Vec<f64>, options: ParserOptions) -> Self {
        Self::from_records(RecordReader::from_read(source, options), labels)
    }
}

impl<'l> LibsvmVectors<'l, BufReader<File>> {
    pub fn from_path(
        path: &Path,
        labels: &'l mut Vec<f64>,
        options: ParserOptions,
    ) -> Result<Self> {
        Ok(Self::from_records(
            RecordReader::from_path(path, options)?,
            labels,
        ))
    }
}

impl<'l> LibsvmVectors<'l, Cursor<String>> {
    pub fn from_text(
        text: impl Into<String>,
        labels: &'l mut Vec<f64>,
        options: ParserOptions,
    ) -> Self {
        Self::from_records(RecordReader::from_text(text, options), labels)
    }
}

impl<R: BufRead> Iterator for LibsvmVectors<'_, R> {
    type Item = Result<SparseVector>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            Some(self.next_vector())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io::Write;
    use std::rc::Rc;

    use tempfile::{tempdir, NamedTempFile};

    use super::*;
    use crate::data::error::RecordErrorKind;
    use crate::data::model::{Label, NO_LABEL};

    const SAMPLE: &str = "\
# generated by exporter
1 3:0.5 7:2.0

   # indented comment
-1 1:1 # trailing note
3:0.25 4:1
";

    /// BufRead over an in-memory buffer that counts how often it is dropped.
    struct TrackedSource {
        inner: Cursor<Vec<u8>>,
        closes: Rc<Cell<usize>>,
    }

    impl TrackedSource {
        fn new(text: &str) -> (Self, Rc<Cell<usize>>) {
            let closes = Rc::new(Cell::new(0));
            let source = TrackedSource {
                inner: Cursor::new(text.as_bytes().to_vec()),
                closes: Rc::clone(&closes),
            };
            (source, closes)
        }
    }

    impl Read for TrackedSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl BufRead for TrackedSource {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            self.inner.fill_buf()
        }

        fn consume(&mut self, amt: usize) {
            self.inner.consume(amt)
        }
    }

    impl Drop for TrackedSource {
        fn drop(&mut self) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    /// Yields `data`, then fails every later read.
    struct FailingSource {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.read(buf)?;
            if n == 0 {
                Err(io::Error::new(io::ErrorKind::Other, "device unplugged"))
            } else {
                Ok(n)
            }
        }
    }

    /// Reports `Interrupted` before every successful read.
    struct InterruptingSource {
        data: Cursor<Vec<u8>>,
        interrupt: bool,
    }

    impl Read for InterruptingSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            // One byte at a time so the `\r\n` pair straddles a refill.
            let len = buf.len().min(1);
            self.data.read(&mut buf[..len])
        }
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let mut labels = Vec::new();
        let vectors: Vec<SparseVector> =
            LibsvmVectors::from_text(SAMPLE, &mut labels, ParserOptions::default())
                .collect::<Result<_>>()
                .unwrap();

        assert_eq!(vectors.len(), 3);
        assert_eq!(labels, vec![1.0, -1.0, NO_LABEL]);
        assert_eq!(vectors[0].sorted_entries(), vec![(3, 0.5), (7, 2.0)]);
        assert_eq!(vectors[1].sorted_entries(), vec![(1, 1.0)]);
        assert_eq!(vectors[2].sorted_entries(), vec![(3, 0.25), (4, 1.0)]);
    }

    #[test]
    fn label_appended_with_each_vector() {
        let mut labels = vec![9.0];
        let mut seq = LibsvmVectors::from_text("1 1:1\n2 2:2\n", &mut labels, Default::default());

        assert!(seq.has_next());
        seq.next_vector().unwrap();
        assert_eq!(seq.labels(), &[9.0, 1.0]);
        seq.next_vector().unwrap();
        assert_eq!(seq.labels(), &[9.0, 1.0, 2.0]);
        assert!(!seq.has_next());
    }

    #[test]
    fn fresh_sequence_is_already_classified() {
        let mut labels = Vec::new();
        let seq = LibsvmVectors::from_text("\n# only comments\n\n", &mut labels, Default::default());
        assert!(!seq.has_next());

        let mut labels = Vec::new();
        let seq = LibsvmVectors::from_text("\n\n1 1:1", &mut labels, Default::default());
        assert!(seq.has_next());
    }

    #[test]
    fn exhaustion_is_stable() {
        let mut labels = Vec::new();
        let mut seq = LibsvmVectors::from_text("1 1:1", &mut labels, Default::default());
        seq.next_vector().unwrap();

        for _ in 0..3 {
            assert!(!seq.has_next());
            assert!(matches!(seq.next_vector(), Err(LibsvmError::Exhausted)));
        }
        assert!(seq.next().is_none());
        assert_eq!(seq.labels().len(), 1);
    }

    #[test]
    fn remove_always_fails() {
        let mut labels = Vec::new();
        let mut seq = LibsvmVectors::from_text("1 1:1", &mut labels, Default::default());
        assert!(matches!(seq.remove(), Err(LibsvmError::Unsupported)));
        seq.next_vector().unwrap();
        assert!(matches!(seq.remove(), Err(LibsvmError::Unsupported)));
    }

    #[test]
    fn source_closed_once_on_exhaustion() {
        let (source, closes) = TrackedSource::new("1 1:1\n\n2 2:2\n");
        let mut reader = RecordReader::new(source, ParserOptions::default());

        assert_eq!(closes.get(), 0);
        reader.next_record().unwrap();
        assert_eq!(closes.get(), 0);
        reader.next_record().unwrap();
        assert_eq!(closes.get(), 1);

        assert!(reader.next_record().is_err());
        drop(reader);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn empty_source_closed_at_construction() {
        let (source, closes) = TrackedSource::new("   \n# nothing\n");
        let reader = RecordReader::new(source, ParserOptions::default());
        assert!(!reader.has_next());
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn abort_policy_stops_at_bad_line() {
        let (source, closes) = TrackedSource::new("1 1:1\n1 x:2\n3 3:3\n");
        let mut labels = Vec::new();
        let mut seq = LibsvmVectors::new(source, &mut labels, ParserOptions::default());

        seq.next_vector().unwrap();
        assert!(seq.has_next());
        match seq.next_vector() {
            Err(LibsvmError::RecordParse(err)) => {
                assert_eq!(err.line_number, Some(2));
                assert_eq!(err.line, "1 x:2");
                assert_eq!(err.kind, RecordErrorKind::InvalidIndex("x".into()));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(!seq.has_next());
        assert!(matches!(seq.next_vector(), Err(LibsvmError::Exhausted)));
        assert_eq!(seq.labels(), &[1.0]);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn skip_policy_drops_bad_lines() {
        let opts = ParserOptions::default().with_error_policy(ErrorPolicy::Skip);
        let mut labels = Vec::new();
        let vectors: Vec<SparseVector> =
            LibsvmVectors::from_text("1 1:1\nbad 2:2\n3 3:oops\n4 4:4\n", &mut labels, opts)
                .collect::<Result<_>>()
                .unwrap();

        assert_eq!(vectors.len(), 2);
        assert_eq!(labels, vec![1.0, 4.0]);
    }

    #[test]
    fn skip_policy_with_only_bad_lines_left() {
        let opts = ParserOptions::default().with_error_policy(ErrorPolicy::Skip);
        let mut reader = RecordReader::from_text("1 1:1\nx\ny\n", opts);
        reader.next_record().unwrap();
        assert!(!reader.has_next());
    }

    #[test]
    fn read_error_ends_sequence_and_reaches_hook() {
        let seen = Rc::new(Cell::new(0));
        let hook_seen = Rc::clone(&seen);
        let source = FailingSource {
            data: Cursor::new(b"1 1:1\n2 2:2".to_vec()),
        };
        let reader = RecordReader::with_read_error_hook(
            BufReader::new(source),
            ParserOptions::default(),
            move |_err: &io::Error| hook_seen.set(hook_seen.get() + 1),
        );

        let mut labels = Vec::new();
        let vectors: Vec<SparseVector> = LibsvmVectors::from_records(reader, &mut labels)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(vectors.len(), 1);
        assert_eq!(labels, vec![1.0]);
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let seen = Rc::new(Cell::new(0));
        let hook_seen = Rc::clone(&seen);
        let source = InterruptingSource {
            data: Cursor::new(b"1 1:1\r\n2 2:2\r".to_vec()),
            interrupt: false,
        };
        let reader = RecordReader::with_read_error_hook(
            BufReader::new(source),
            ParserOptions::default(),
            move |_err: &io::Error| hook_seen.set(hook_seen.get() + 1),
        );

        let records: Vec<Record> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].vector.sorted_entries(), vec![(2, 2.0)]);
        assert_eq!(seen.get(), 0);
    }

    #[test]
    fn crlf_and_latin1() {
        let bytes: &[u8] = b"1 1:1\r\n# caf\xe9\r\n2 2:2\r\n";
        let opts = ParserOptions::default().with_encoding(Encoding::Latin1);
        let records: Vec<Record> = RecordReader::from_read(bytes, opts)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].label, Label::Value(2.0));
    }

    #[test]
    fn carriage_return_ends_a_line() {
        let mut labels = Vec::new();
        let vectors: Vec<SparseVector> =
            LibsvmVectors::from_text("# h\r1 1:1\r2 2:2\r", &mut labels, Default::default())
                .collect::<Result<_>>()
                .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(labels, vec![1.0, 2.0]);
    }

    #[test]
    fn mixed_line_endings_count_lines() {
        let mut reader = RecordReader::from_text("1 1:1\r\n\r2 2:2\n3 x:3", ParserOptions::default());
        reader.next_record().unwrap();
        reader.next_record().unwrap();
        match reader.next_record() {
            Err(LibsvmError::RecordParse(err)) => assert_eq!(err.line_number, Some(4)),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn control_characters_trim_to_blank() {
        let mut labels = Vec::new();
        let vectors: Vec<SparseVector> =
            LibsvmVectors::from_text("1 1:1\n\u{1a}\n\0 2 2:2 \0\n", &mut labels, Default::default())
                .collect::<Result<_>>()
                .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(labels, vec![1.0, 2.0]);
    }

    #[test]
    fn custom_comment_marker() {
        let opts = ParserOptions::default().with_comment_marker('%');
        let records: Vec<Record> = RecordReader::from_text("% head\n1 1:1 % tail\n", opts)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].vector.sorted_entries(), vec![(1, 1.0)]);
    }

    #[test]
    fn from_path_reports_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.svm");
        let mut labels = Vec::new();
        match LibsvmVectors::from_path(&path, &mut labels, ParserOptions::default()) {
            Err(LibsvmError::Open { path: p, .. }) => assert_eq!(p, path),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("expected open failure"),
        }
    }

    #[test]
    fn from_path_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"1 1:1\n0 2:2\n").unwrap();

        let mut labels = Vec::new();
        let count = LibsvmVectors::from_path(file.path(), &mut labels, ParserOptions::default())
            .unwrap()
            .count();

        assert_eq!(count, 2);
        assert_eq!(labels, vec![1.0, 0.0]);
    }
}
