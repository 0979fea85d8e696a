//! Record a region of a video.

use std::sync::atomic::Ordering;

use clipdeck_capture_engine::{
    probe_media, record_crop, FfmpegVideoSource, FfmpegWebmRecorder, PacedVsync, RecordOptions,
    StreamRecorder,
};
use clipdeck_common::config::{AppConfig, Quality};
use clipdeck_media_model::geometry::{PixelSize, Point};
use clipdeck_processing_core::{PointerInput, PointerPhase, RegionSelector};
use clipdeck_render_engine::render_selection_overlay;

use super::{print_progress, report, save_asset};
use crate::CropArgs;

/// Replay the selection as a mouse drag on the preview surface.
fn select(args: &CropArgs) -> RegionSelector {
    let (from, to) = match (args.drag, args.select) {
        (Some(drag), _) => drag,
        (None, Some(rect)) => (
            Point::new(rect.x, rect.y),
            Point::new(rect.right(), rect.bottom()),
        ),
        (None, None) => (Point::default(), Point::default()),
    };

    let mut selector = RegionSelector::new(args.display);
    selector.pointer(PointerPhase::Down, &PointerInput::Mouse { client: from });
    selector.pointer(PointerPhase::Move, &PointerInput::Mouse { client: to });
    selector.pointer(PointerPhase::Up, &PointerInput::Mouse { client: to });
    selector
}

pub async fn run(args: CropArgs, config: &AppConfig) -> anyhow::Result<()> {
    let selector = select(&args);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&selector.state())?);
    }

    if let Some(path) = &args.overlay {
        render_selection_overlay(&selector.redraw())
            .save(path)
            .map_err(|e| anyhow::anyhow!("Failed to write overlay {}: {e}", path.display()))?;
        println!("Overlay: {}", path.display());
    }

    let native: PixelSize = match args.native {
        Some(native) => native,
        None => probe_media(&args.input).map_err(report)?.native,
    };

    let source_rect = selector
        .source_rect(native)
        .ok_or_else(|| anyhow::anyhow!("Cannot start: no selection"))?;
    let region = selector.capture_region(native).map_err(report)?;

    println!("Input:         {} ({native})", args.input.display());
    println!(
        "Source rect:   x={:.1} y={:.1} w={:.1} h={:.1}",
        source_rect.x, source_rect.y, source_rect.w, source_rect.h
    );
    println!("Crop command:  {}", region.crop_command());

    if args.dry_run {
        return Ok(());
    }

    let quality = match &args.quality {
        Some(name) => Quality::parse(name).map_err(report)?,
        None => config.recording.quality,
    };
    let recorder = StreamRecorder::from_config(&config.recording);
    let source = FfmpegVideoSource::open(&args.input, recorder.fps()).map_err(report)?;
    let companion_audio = source.info().has_audio.then(|| args.input.clone());

    // Ctrl-C pauses the source, which ends the recording cleanly.
    let pause = source.pause_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted; finishing recording");
            pause.store(true, Ordering::SeqCst);
        }
    });

    let mut vsync = PacedVsync::new(recorder.fps());
    let options = RecordOptions {
        quality,
        companion_audio,
        progress: Some(Box::new(print_progress)),
        stop: None,
    };

    let asset = record_crop(
        source,
        region,
        &recorder,
        Box::new(FfmpegWebmRecorder::new()),
        &mut vsync,
        options,
    )
    .await
    .map_err(|e| {
        println!();
        report(e)
    })?;

    let path = save_asset(&asset, args.output, &config.output_dir)?;
    println!("\nSaved {} ({} bytes)", path.display(), asset.len());
    Ok(())
}
