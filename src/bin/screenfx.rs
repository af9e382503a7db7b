use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "screenfx", version)]
struct Cli {
    /// Log sequencing details to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply an effect stack to a PNG.
    Apply(ApplyArgs),
    /// Print the default settings of every effect kind as a stack config.
    Defaults,
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    /// Input PNG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Stack config JSON. Without one, a default bloom is applied.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grayscale PNG holding device depth (black = near plane).
    #[arg(long)]
    depth: Option<PathBuf>,

    /// RGBA PNG holding encoded view normals (rg) and depth (ba).
    #[arg(long)]
    depth_normals: Option<PathBuf>,

    /// Seconds on the effect clock for the first frame.
    #[arg(long, default_value_t = 0.0)]
    time: f32,

    /// Run the stack this many times, feeding each output back in, 1/30 s apart.
    #[arg(long, default_value_t = 1)]
    frames: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Apply(args) => cmd_apply(args),
        Command::Defaults => cmd_defaults(),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "screenfx=debug" } else { "screenfx=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_rgba(path: &Path) -> anyhow::Result<screenfx::Image> {
    let img = image::open(path)
        .with_context(|| format!("read image '{}'", path.display()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    Ok(screenfx::Image::from_rgba8(w, h, img.into_raw())?)
}

fn load_depth(path: &Path) -> anyhow::Result<screenfx::Image> {
    let img = image::open(path)
        .with_context(|| format!("read depth '{}'", path.display()))?
        .to_luma32f();
    let (w, h) = img.dimensions();
    Ok(screenfx::Image::from_depth(w, h, img.as_raw())?)
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => screenfx::StackConfig::from_path(path)?,
        None => screenfx::StackConfig {
            effects: vec![screenfx::EffectConfig::Bloom(Default::default())],
            ..Default::default()
        },
    };
    let mut stack = config.build_stack()?;
    let mut renderer = screenfx::CpuRenderer::new(config.renderer);

    let source = load_rgba(&args.in_path)?;
    let depth = args.depth.as_deref().map(load_depth).transpose()?;
    let depth_normals = args
        .depth_normals
        .as_deref()
        .map(|p| load_rgba(p).map(|img| img.with_filter(screenfx::FilterMode::Nearest)))
        .transpose()?;

    let mut current = source;
    let mut output = screenfx::Image::new(current.desc())?;
    for i in 0..args.frames.max(1) {
        let mut frame = screenfx::FrameInputs::new(config.camera)
            .with_time(args.time + i as f32 / 30.0);
        if let Some(d) = &depth {
            frame = frame.with_depth(d);
        }
        if let Some(dn) = &depth_normals {
            frame = frame.with_depth_normals(dn);
        }

        let report = stack
            .render(&mut renderer, &frame, &current, &mut output)
            .with_context(|| format!("render frame {i}"))?;
        tracing::debug!(frame = i, effects = report.effects.len(), "frame done");
        std::mem::swap(&mut current, &mut output);
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        current.data(),
        current.width(),
        current.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    let stats = renderer.pool_stats();
    eprintln!(
        "wrote {} ({} passes, {} scratch acquisitions)",
        args.out.display(),
        renderer.passes_run(),
        stats.acquisitions
    );
    Ok(())
}

fn cmd_defaults() -> anyhow::Result<()> {
    let config = screenfx::StackConfig {
        effects: screenfx::EffectConfig::all_defaults(),
        ..Default::default()
    };
    println!("{}", config.to_json_pretty()?);
    Ok(())
}
