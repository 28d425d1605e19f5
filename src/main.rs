mod args;

use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();

    let opts = args::parse_arguments();
    let summary = libsvm_vectors::driver::convert(&opts)?;

    log::info!(
        "Converted {} file(s), {} vectors, {} labels",
        summary.files.len(),
        summary.total_vectors(),
        summary.labels.len()
    );
    Ok(())
}
