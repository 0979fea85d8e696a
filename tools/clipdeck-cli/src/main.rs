//! Clipdeck CLI: crop videos, strip vocals, and render animated quotes.
//!
//! Usage:
//!   clipdeck crop <INPUT> --display WxH --select x,y,w,h   Record a region of a video
//!   clipdeck remove-vocals <INPUT>                         Write an instrumental WAV
//!   clipdeck quote --title TEXT --author NAME              Record an animated quote
//!   clipdeck check                                         Check system capabilities

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clipdeck_common::config::AppConfig;
use clipdeck_media_model::geometry::{DisplayRect, Point, Size};

mod commands;

#[derive(Parser)]
#[command(
    name = "clipdeck",
    about = "Crop videos, remove vocals, and record animated quotes",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a rectangular region of a video to WebM
    Crop(CropArgs),

    /// Remove center-panned audio (usually vocals) from a stereo track
    RemoveVocals {
        /// Audio file to process
        input: PathBuf,

        /// Output WAV path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record an animated quote card to WebM
    Quote(QuoteArgs),

    /// Check system capabilities
    Check,
}

#[derive(Args)]
#[command(group = clap::ArgGroup::new("selection").required(true).args(["select", "drag"]))]
pub struct CropArgs {
    /// Video file to crop
    pub input: PathBuf,

    /// Size of the preview surface the selection was made on
    #[arg(long, value_parser = commands::parse_size)]
    pub display: Size,

    /// Selection in display pixels: x,y,w,h
    #[arg(long, value_parser = commands::parse_rect)]
    pub select: Option<DisplayRect>,

    /// Selection as a drag gesture in display pixels: x0,y0:x1,y1
    #[arg(long, value_parser = commands::parse_drag)]
    pub drag: Option<(Point, Point)>,

    /// Native video size; probed with ffprobe when omitted
    #[arg(long, value_parser = commands::parse_pixel_size)]
    pub native: Option<clipdeck_media_model::geometry::PixelSize>,

    /// Quality tier: low, medium, high
    #[arg(long)]
    pub quality: Option<String>,

    /// Output WebM path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Save the selection overlay as a PNG
    #[arg(long)]
    pub overlay: Option<PathBuf>,

    /// Print the resolved region and crop command without recording
    #[arg(long)]
    pub dry_run: bool,

    /// Print the selector state as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct QuoteArgs {
    /// Quote text
    #[arg(long)]
    pub title: String,

    /// Attribution shown under the quote
    #[arg(long, default_value = "")]
    pub author: String,

    /// Theme: sunset, ocean, forest, midnight, aurora
    #[arg(long)]
    pub theme: Option<String>,

    /// Animation length in milliseconds
    #[arg(long)]
    pub duration_ms: Option<u64>,

    /// Quality tier: low, medium, high
    #[arg(long)]
    pub quality: Option<String>,

    /// TrueType font for the text
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Output WebM path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load();

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    clipdeck_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Crop(args) => commands::crop::run(args, &config).await,
        Commands::RemoveVocals { input, output } => {
            commands::vocals::run(input, output, &config).await
        }
        Commands::Quote(args) => commands::quote::run(args, &config).await,
        Commands::Check => commands::check::run(&config),
    }
}
