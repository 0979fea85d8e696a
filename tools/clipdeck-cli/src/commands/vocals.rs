//! Strip center-panned audio from a stereo track.

use std::path::PathBuf;

use clipdeck_audio::{decoder_for, remove_vocals};
use clipdeck_common::config::AppConfig;
use clipdeck_common::error::ClipdeckError;

use super::{report, save_asset};

pub async fn run(
    input: PathBuf,
    output: Option<PathBuf>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("Removing vocals from: {}", input.display());

    if !input.exists() {
        return Err(report(ClipdeckError::FileNotFound { path: input }));
    }
    let bytes = tokio::fs::read(&input)
        .await
        .map_err(|e| report(ClipdeckError::from(e)))?;

    let decoder = decoder_for(&bytes);
    tracing::debug!(decoder = decoder.name(), "Selected audio decoder");

    let asset = remove_vocals(&input, bytes, decoder.as_ref())
        .await
        .map_err(report)?;

    let path = save_asset(&asset, output, &config.output_dir)?;
    println!("Saved {} ({} bytes)", path.display(), asset.len());
    Ok(())
}
