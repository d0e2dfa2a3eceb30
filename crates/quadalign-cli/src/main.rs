//! quadalign CLI - align and export batches of annotated photos.
//!
//! Usage:
//!   quadalign export <DIR>              Export every photo to <DIR>/out
//!   quadalign info <DIR>                Show project configuration and annotations
//!   quadalign annotate <DIR> <PHOTO>    Show or set a photo's corners
//!   quadalign configure <DIR>           Change crop margins or output width

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod args;
mod commands;
mod logging;

use args::FilterArg;
use logging::LoggingConfig;

#[derive(Parser)]
#[command(
    name = "quadalign",
    about = "Straighten, centre and crop photos from four marked corners",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every photo in the project to <DIR>/out/<index>.jpg
    Export {
        /// Path to the project directory
        path: PathBuf,

        /// JPEG quality (1-100)
        #[arg(short, long, default_value = "90", value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,

        /// Skip photos without a usable annotation instead of failing
        #[arg(long)]
        skip_unannotated: bool,

        /// Interpolation used when warping onto the crop canvas
        #[arg(long, value_enum, default_value = "bicubic")]
        warp_filter: FilterArg,

        /// Filter used when downsampling to the output width
        #[arg(long, value_enum, default_value = "bicubic")]
        resize_filter: FilterArg,

        /// Largest allowed disagreement between the two tilt estimates when
        /// both edges lean the same way, in degrees (0 disables the check).
        /// Edges leaning apart, as in keystoned shots, are always accepted
        #[arg(long, default_value = "30")]
        max_tilt_divergence: f64,
    },

    /// Show project configuration and annotation state
    Info {
        /// Path to the project directory
        path: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or edit the corners of one photo
    Annotate {
        /// Path to the project directory
        path: PathBuf,

        /// Photo file name inside the project
        photo: String,

        /// Corners in order top-left, top-right, bottom-right, bottom-left
        #[arg(long, value_name = "\"x,y x,y x,y x,y\"", conflicts_with = "clear")]
        points: Option<String>,

        /// Remove the annotation
        #[arg(long)]
        clear: bool,
    },

    /// Change crop margins or output width
    Configure {
        /// Path to the project directory
        path: PathBuf,

        /// Margins around the anchor as T,R,B,L
        #[arg(long, value_name = "T,R,B,L")]
        crop: Option<String>,

        /// Output width in pixels
        #[arg(long)]
        width: Option<u32>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    logging::init_logging(&LoggingConfig {
        level: log_level.to_string(),
        json: cli.log_json,
    });

    match cli.command {
        Commands::Export {
            path,
            quality,
            skip_unannotated,
            warp_filter,
            resize_filter,
            max_tilt_divergence,
        } => commands::export::run(
            path,
            quality,
            skip_unannotated,
            warp_filter,
            resize_filter,
            max_tilt_divergence,
        ),
        Commands::Info { path, json } => commands::info::run(path, json),
        Commands::Annotate {
            path,
            photo,
            points,
            clear,
        } => commands::annotate::run(path, photo, points, clear),
        Commands::Configure { path, crop, width } => commands::configure::run(path, crop, width),
    }
}
