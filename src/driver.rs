use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::config::ParserOptions;
use crate::data::LibsvmVectors;
use crate::output::{create_writer, write_vectors, OutputFormat};

// ---------------------------------------------------------------------------
// Conversion settings
// ---------------------------------------------------------------------------

/// Everything one conversion run needs.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// A LIBSVM file, or a directory whose regular files are all converted.
    pub input: PathBuf,
    pub output_dir: PathBuf,
    /// Label dictionary file, one label per line.
    pub dict_out: PathBuf,
    /// Cap on vectors written per input file.
    pub max_vectors: Option<u64>,
    pub format: OutputFormat,
    pub parser: ParserOptions,
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    /// Output file and number of vectors written, per input file.
    pub files: Vec<(PathBuf, u64)>,
    pub labels: Vec<f64>,
}

impl ConversionSummary {
    pub fn total_vectors(&self) -> u64 {
        self.files.iter().map(|(_, n)| n).sum()
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Convert every input file, then write the shared label dictionary.
pub fn convert(opts: &ConvertOptions) -> Result<ConversionSummary> {
    let inputs = input_files(&opts.input)?;

    fs::create_dir_all(&opts.output_dir)
        .with_context(|| format!("creating output dir {}", opts.output_dir.display()))?;
    log::info!("Output Dir: {}", opts.output_dir.display());
    log::debug!(
        "Parsing with comment marker '{}', encoding {}, {:?} on malformed records",
        opts.parser.comment_marker,
        opts.parser.encoding,
        opts.parser.error_policy
    );

    let mut labels = Vec::new();
    let mut files = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let written = convert_file(input, opts, &mut labels)
            .with_context(|| format!("converting {}", input.display()))?;
        files.push(written);
    }

    log::info!("Dictionary Output file: {}", opts.dict_out.display());
    write_dictionary(&opts.dict_out, &labels)?;

    Ok(ConversionSummary { files, labels })
}

/// Files to convert: the input itself, or a directory's regular files in
/// name order.
pub fn input_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_dir() {
        let mut files = Vec::new();
        for entry in fs::read_dir(input)
            .with_context(|| format!("listing {}", input.display()))?
        {
            let path = entry.context("reading directory entry")?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    } else if input.exists() {
        Ok(vec![input.to_path_buf()])
    } else {
        bail!("Input not found: {}", input.display())
    }
}

/// Output path for `input`: `<output_dir>/<file name>.<extension>`.
pub fn output_path(input: &Path, output_dir: &Path, format: OutputFormat) -> Result<PathBuf> {
    let name = input
        .file_name()
        .with_context(|| format!("{} has no file name", input.display()))?
        .to_string_lossy();
    Ok(output_dir.join(format!("{name}.{}", format.extension())))
}

fn convert_file(
    input: &Path,
    opts: &ConvertOptions,
    labels: &mut Vec<f64>,
) -> Result<(PathBuf, u64)> {
    log::info!("Converting File: {}", input.display());
    let out_path = output_path(input, &opts.output_dir, opts.format)?;

    let vectors = LibsvmVectors::from_path(input, labels, opts.parser)?;
    let mut writer = create_writer(opts.format, &out_path)?;
    let written = write_vectors(writer.as_mut(), vectors, opts.max_vectors)?;
    writer.finish()?;

    log::info!("Wrote: {written} vectors to {}", out_path.display());
    Ok((out_path, written))
}

/// Write one label per line in the layout of [`format_label`].
pub fn write_dictionary(path: &Path, labels: &[f64]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating dictionary file {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for &label in labels {
        writeln!(out, "{}", format_label(label))?;
    }
    out.flush().context("flushing dictionary file")?;
    Ok(())
}

/// Shortest round-tripping text for `x`: plain decimal when
/// `1e-3 <= |x| < 1e7`, otherwise `d.dddE±n` (`1.0E7`, `-1.7976931348623157E308`).
pub fn format_label(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = x.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        // Debug keeps a trailing `.0` and stays decimal inside this range.
        return format!("{x:?}");
    }

    let scientific = format!("{x:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    if mantissa.contains('.') {
        format!("{mantissa}E{exponent}")
    } else {
        format!("{mantissa}.0E{exponent}")
    }
}
