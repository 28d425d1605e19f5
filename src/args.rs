use std::path::PathBuf;

use clap::{error::ErrorKind, Parser};

use libsvm_vectors::config::{Encoding, ErrorPolicy, ParserOptions};
use libsvm_vectors::driver::ConvertOptions;
use libsvm_vectors::output::OutputFormat;

/// Convert LIBSVM files into sparse vector files plus a label dictionary.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// LIBSVM file, or a directory whose files are all converted
    #[arg(short = 'd', long, value_parser = validate_input)]
    input: PathBuf,

    /// Output directory; each input becomes `<name>.<format extension>`
    #[arg(short, long)]
    output: PathBuf,

    /// File receiving the parsed labels, one per line
    #[arg(short = 't', long, alias = "dictOut")]
    dict_out: PathBuf,

    /// Maximum number of vectors written per input file
    #[arg(short, long)]
    max: Option<u64>,

    /// Vector file format
    #[arg(short = 'e', long, alias = "outputWriter", value_enum, default_value_t = OutputFormat::Parquet)]
    output_writer: OutputFormat,

    /// Character that starts a comment
    #[arg(long, default_value_t = '#')]
    comment_marker: char,

    /// Input encoding (utf8 or latin1)
    #[arg(long, default_value = "utf8")]
    encoding: Encoding,

    /// What to do with a malformed record (abort or skip)
    #[arg(long, default_value = "abort")]
    on_error: ErrorPolicy,
}

/// Validates that the input path exists
fn validate_input(path: &str) -> Result<PathBuf, clap::Error> {
    let path = PathBuf::from(path);
    if !path.exists() {
        return Err(clap::Error::raw(
            ErrorKind::InvalidValue,
            format!("Input not found: {}\n", path.display()),
        ));
    }
    Ok(path)
}

/// Parses command line arguments into conversion options
pub fn parse_arguments() -> ConvertOptions {
    Args::parse().into_options()
}

impl Args {
    fn into_options(self) -> ConvertOptions {
        ConvertOptions {
            input: self.input,
            output_dir: self.output,
            dict_out: self.dict_out,
            max_vectors: self.max,
            format: self.output_writer,
            parser: ParserOptions::default()
                .with_comment_marker(self.comment_marker)
                .with_encoding(self.encoding)
                .with_error_policy(self.on_error),
        }
    }
}
