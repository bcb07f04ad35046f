use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use serde::Serialize;

use sitesource::cli::Cli;
use sitesource::{capture, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    logging::init_logging()?;

    let summary = capture::run(args.capture_config()).await?;
    tracing::info!(
        saved = summary.assets_saved,
        failed = summary.assets_failed,
        files = summary.files.len(),
        "mirror written to {}",
        summary.output_dir
    );

    if let Some(path) = &args.summary {
        write_json(path, &summary)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
    }

    Ok(())
}

fn write_json<T: Serialize>(path: &std::path::Path, v: &T) -> Result<()> {
    std::fs::write(path, serde_json::to_vec_pretty(v)?)?;
    Ok(())
}
