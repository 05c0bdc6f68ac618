//! edgefix - inspect and validate border repair schedules.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use edgefix_core::{ClipInfo, Edges, FrameRate, VideoFormat};
use edgefix_filters::{BalanceParams, Resize, Services};
use edgefix_zones::{CropReaderParams, CropResizeReader, CropZone, DebandZone, ExtractZone, Schedule};

#[derive(Parser, Debug)]
#[command(name = "edgefix", version, about = "Border repair schedule tools")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved geometry of every zone of a crop schedule as JSON.
    Plan(PlanArgs),
    /// Validate a schedule file.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Crop schedule.
    #[arg(long)]
    schedule: PathBuf,

    /// Source width.
    #[arg(long)]
    width: u32,

    /// Source height.
    #[arg(long)]
    height: u32,

    /// Number of frames in the source.
    #[arg(long)]
    frames: u32,

    /// Source pixel format.
    #[arg(long, value_enum, default_value_t = Format::Yuv420p8)]
    format: Format,

    /// Output width.
    #[arg(long)]
    target_width: Option<u32>,

    /// Output height.
    #[arg(long)]
    target_height: Option<u32>,

    /// Crops up to this many pixels are filled instead.
    #[arg(long, default_value_t = 2)]
    fill_max: u32,

    /// Resize kernel.
    #[arg(long, default_value = "spline36")]
    kernel: String,

    /// Border balance thickness as left,right,top,bottom.
    #[arg(long, value_delimiter = ',', num_args = 4)]
    balance: Option<Vec<u32>>,

    /// Balance threshold in 8-bit levels.
    #[arg(long, default_value_t = 128)]
    threshold: i64,

    /// Balance blur divisor.
    #[arg(long, default_value_t = 999)]
    blur: u32,

    /// Edges (left,right,top,bottom) fixed even where the crop is zero.
    #[arg(long, value_delimiter = ',', num_args = 4)]
    fix_uncrop: Option<Vec<bool>>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Schedule kind.
    #[arg(long, value_enum)]
    kind: Kind,

    /// Schedule file.
    file: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Crop,
    Deband,
    Extract,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Gray8,
    Gray16,
    Yuv420p8,
    Yuv420p10,
    Yuv420p16,
    Yuv422p10,
    Yuv444p8,
    Yuv444p16,
    Rgb24,
}

impl From<Format> for VideoFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Gray8 => VideoFormat::GRAY8,
            Format::Gray16 => VideoFormat::GRAY16,
            Format::Yuv420p8 => VideoFormat::YUV420P8,
            Format::Yuv420p10 => VideoFormat::YUV420P10,
            Format::Yuv420p16 => VideoFormat::YUV420P16,
            Format::Yuv422p10 => VideoFormat::YUV422P10,
            Format::Yuv444p8 => VideoFormat::YUV444P8,
            Format::Yuv444p16 => VideoFormat::YUV444P16,
            Format::Rgb24 => VideoFormat::RGB24,
        }
    }
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn cmd_plan(args: PlanArgs) -> Result<()> {
    let schedule = Schedule::<CropZone>::load(&args.schedule)?;
    let input = ClipInfo {
        format: args.format.into(),
        width: args.width,
        height: args.height,
        num_frames: args.frames,
        frame_rate: FrameRate::default(),
    };
    let balance = args.balance.as_deref().map(|e| BalanceParams {
        edges: Edges::new(e[0], e[1], e[2], e[3]),
        threshold: args.threshold,
        blur: args.blur,
    });
    let fix_uncrop = args
        .fix_uncrop
        .as_deref()
        .map(|m| Edges::new(m[0], m[1], m[2], m[3]))
        .unwrap_or(Edges::uniform(false));
    let params = CropReaderParams {
        width: args.target_width,
        height: args.target_height,
        fill_max: args.fill_max,
        balance,
        fix_uncrop,
        resize: Resize::named(&args.kernel, None, None)?,
        ..CropReaderParams::default()
    };

    let reader = CropResizeReader::new(input, &schedule, params, Services::cpu())?;
    let json = serde_json::to_string_pretty(reader.plan()).context("serialize plan")?;
    println!("{json}");
    Ok(())
}

fn cmd_check(args: CheckArgs) -> Result<()> {
    let zones = match args.kind {
        Kind::Crop => Schedule::<CropZone>::load(&args.file)?.len(),
        Kind::Deband => Schedule::<DebandZone>::load(&args.file)?.len(),
        Kind::Extract => Schedule::<ExtractZone>::load(&args.file)?.len(),
    };
    info!(zones, "schedule is valid");
    println!("{}: {zones} zones", args.file.display());
    Ok(())
}
