use clap::{ArgAction, Args, Parser, Subcommand};
use grafika::config::{self, CONFIG_FILE_NAME};
use grafika::imaging::Quality;
use grafika::{BackendKind, BackendRegistry, Color, Editor, Filter, Position, Similarity};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Input and output files shared by the editing commands.
#[derive(Args, Clone)]
struct InOut {
    /// Image to read
    input: PathBuf,

    /// Where to write the result; the extension picks the format
    output: PathBuf,

    /// JPEG quality (0-100), overrides [output] jpeg_quality
    #[arg(long)]
    quality: Option<u32>,
}

#[derive(Parser)]
#[command(name = "grafika")]
#[command(about = "Resize, crop, rotate, filter and compare images")]
#[command(long_about = "\
Resize, crop, rotate, filter and compare images

Backends are probed in priority order and the first available one does the
work:

  skia     anti-aliased shapes, bicubic resampling, any-angle rotation
  raster   aliased shapes, triangle resampling, lossless right angles

Positions accept left, top, center, right, bottom or a pixel offset.
Resize modes: exact, exactWidth, exactHeight, fit, fill.

Run 'grafika gen-config' to generate a documented grafika.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file means stock defaults)
    #[arg(long, default_value = CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// Backend to try, in order. Repeat to give several. Overrides [backends] order
    #[arg(long = "backend", global = true)]
    backends: Vec<BackendKind>,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List backends in priority order and whether each is usable
    Backends,
    /// Resize an image
    Resize {
        #[command(flatten)]
        files: InOut,
        width: u32,
        height: u32,
        /// exact, exactWidth, exactHeight, fit or fill
        #[arg(long, default_value = "fit")]
        mode: String,
    },
    /// Cut a region out of an image
    Crop {
        #[command(flatten)]
        files: InOut,
        width: u32,
        height: u32,
        #[arg(short, long, default_value = "center", allow_hyphen_values = true)]
        x: Position,
        #[arg(short, long, default_value = "center", allow_hyphen_values = true)]
        y: Position,
    },
    /// Rotate counter-clockwise by an angle in degrees
    Rotate {
        #[command(flatten)]
        files: InOut,
        #[arg(allow_negative_numbers = true)]
        angle: f64,
        /// Color for the uncovered corners, as #RRGGBB
        #[arg(long)]
        background: Option<Color>,
    },
    /// Scale transparency (0.0 invisible, 1.0 unchanged)
    Opacity {
        #[command(flatten)]
        files: InOut,
        factor: f64,
    },
    /// Apply dither, grayscale or sobel
    Filter {
        #[command(flatten)]
        files: InOut,
        name: Filter,
    },
    /// Perceptual distance between two images (0 = identical)
    Compare {
        a: PathBuf,
        b: PathBuf,
        /// Print a JSON report
        #[arg(long)]
        json: bool,
    },
    /// Exact RGB equality of two images
    Equal { a: PathBuf, b: PathBuf },
    /// Print a stock grafika.toml with all options documented
    GenConfig,
}

#[derive(Serialize)]
struct CompareReport<'a> {
    a: &'a std::path::Path,
    b: &'a std::path::Path,
    distance: u32,
    verdict: &'static str,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let settings = config::load_config(&cli.config)?;
    let mut registry = BackendRegistry::from_config(&settings)?;
    if !cli.backends.is_empty() {
        registry.set_order(cli.backends.clone());
    }

    match cli.command {
        Command::Backends => {
            let selected = registry.detect_available(None).ok();
            for &kind in registry.order() {
                let marker = if Some(kind) == selected { "*" } else { " " };
                let status = if registry.probe(kind) {
                    "available"
                } else {
                    "unavailable"
                };
                println!("{marker} {:<8} {status}", kind.name());
            }
            if selected.is_none() {
                return Err("no backend available".into());
            }
        }
        Command::Resize {
            files,
            width,
            height,
            mode,
        } => edit(&registry, &files, |e| e.resize(width, height, &mode).map(drop))?,
        Command::Crop {
            files,
            width,
            height,
            x,
            y,
        } => edit(&registry, &files, |e| e.crop(width, height, x, y).map(drop))?,
        Command::Rotate {
            files,
            angle,
            background,
        } => edit(&registry, &files, |e| e.rotate(angle, background).map(drop))?,
        Command::Opacity { files, factor } => {
            edit(&registry, &files, |e| e.opacity(factor).map(drop))?
        }
        Command::Filter { files, name } => edit(&registry, &files, |e| e.apply(name).map(drop))?,
        Command::Compare { a, b, json } => {
            let distance = registry.create_editor()?.compare(&a, &b)?;
            let verdict = Similarity::from_distance(distance).as_str();
            if json {
                let report = CompareReport {
                    a: &a,
                    b: &b,
                    distance,
                    verdict,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{distance} ({verdict})");
            }
        }
        Command::Equal { a, b } => {
            let equal = registry.create_editor()?.equal(&a, &b)?;
            println!("{}", if equal { "equal" } else { "different" });
        }
        // Printed before the config was loaded.
        Command::GenConfig => {}
    }

    Ok(())
}

/// Open `files.input`, run `op`, save to `files.output`.
fn edit(
    registry: &BackendRegistry,
    files: &InOut,
    op: impl FnOnce(&mut Editor) -> grafika::Result<()>,
) -> grafika::Result<()> {
    let mut editor = registry.create_image(&files.input)?;
    op(&mut editor)?;
    let mut options = editor.defaults().save.clone();
    if let Some(quality) = files.quality {
        options.quality = Quality::new(quality);
    }
    editor.save_with(&files.output, &options)?;
    let (width, height) = editor.dimensions()?;
    println!(
        "{} → {} ({width}x{height}, {})",
        files.input.display(),
        files.output.display(),
        editor.backend().name()
    );
    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
