//! Record an animated quote card.

use clipdeck_capture_engine::{
    record_quote, FfmpegWebmRecorder, PacedVsync, RecordOptions, StopSignal, StreamRecorder,
};
use clipdeck_common::config::{AppConfig, Quality};
use clipdeck_render_engine::{theme_by_name, FontPainter, QuoteScene};

use super::{print_progress, report, save_asset};
use crate::QuoteArgs;

pub async fn run(args: QuoteArgs, config: &AppConfig) -> anyhow::Result<()> {
    let defaults = &config.animation;
    let theme = theme_by_name(args.theme.as_deref().unwrap_or(&defaults.theme)).map_err(report)?;
    let quality = match &args.quality {
        Some(name) => Quality::parse(name).map_err(report)?,
        None => config.recording.quality,
    };

    let scene = QuoteScene {
        title: args.title,
        author: args.author,
        theme,
        width: defaults.width,
        height: defaults.height,
        duration_ms: args.duration_ms.unwrap_or(defaults.duration_ms),
    };
    scene.validate().map_err(report)?;

    let painter = match args.font.as_ref().or(defaults.font_path.as_ref()) {
        Some(path) => FontPainter::load(path),
        None => FontPainter::from_system(),
    }
    .map_err(report)?;

    println!("Recording quote animation");
    println!("  Theme:    {}", theme.name);
    println!("  Canvas:   {}x{}", scene.width, scene.height);
    println!("  Duration: {} ms", scene.duration_ms);

    // Ctrl-C ends the animation early and keeps what was recorded.
    let stop = StopSignal::new();
    let on_interrupt = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted; finishing recording");
            on_interrupt.trigger();
        }
    });

    let recorder = StreamRecorder::from_config(&config.recording);
    let mut vsync = PacedVsync::new(recorder.fps());
    let options = RecordOptions {
        quality,
        companion_audio: None,
        progress: Some(Box::new(print_progress)),
        stop: Some(stop),
    };

    let asset = record_quote(
        scene,
        painter,
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
