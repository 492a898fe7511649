use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use chromaplay::{
    FilterCatalog, FrameRequestId, FrameRgba, FrameScheduler, IntervalScheduler,
    IterationOutcome, ManualScheduler, PixelSurface, Player, PlayerConfig, SimulatedMedia,
    TimedIntent,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chromaplay", version)]
struct Cli {
    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the video catalog as JSON.
    Catalog(CatalogArgs),
    /// List the available filters.
    Filters,
    /// Filter a single still image through one frame-loop iteration.
    Frame(FrameArgs),
    /// Run a headless playback session and print the final state as JSON.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct CatalogArgs {
    /// JSON catalog to print instead of the built-in one.
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Filter name.
    #[arg(long, default_value = "identity")]
    filter: String,

    /// Surface width (defaults to the image width).
    #[arg(long)]
    width: Option<u32>,

    /// Surface height (defaults to the image height).
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Player config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON array of timed intents, e.g. `[{"at":0.5,"intent":"play_pause"}]`.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Session length in seconds of playback clock.
    #[arg(long, default_value_t = 5.0)]
    seconds: f64,

    /// Override the configured filter.
    #[arg(long)]
    filter: Option<String>,

    /// Show this image as every video's content instead of the synthetic gradient.
    #[arg(long)]
    still: Option<PathBuf>,

    /// Pace refreshes on the wall clock instead of running as fast as possible.
    #[arg(long)]
    realtime: bool,

    /// Write the last committed surface content as PNG.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Catalog(args) => cmd_catalog(args),
        Command::Filters => cmd_filters(),
        Command::Frame(args) => cmd_frame(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn cmd_catalog(args: CatalogArgs) -> anyhow::Result<()> {
    let cfg = PlayerConfig {
        catalog: args.catalog,
        ..PlayerConfig::default()
    };
    let catalog = cfg.load_catalog()?;
    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}

fn cmd_filters() -> anyhow::Result<()> {
    for (i, f) in FilterCatalog::builtin().iter().enumerate() {
        println!("{i}\t{}", f.name());
    }
    Ok(())
}

fn read_frame(path: &Path) -> anyhow::Result<FrameRgba> {
    let img = image::open(path)
        .with_context(|| format!("open image '{}'", path.display()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    Ok(FrameRgba::new(w, h, img.into_raw())?)
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let frame = read_frame(&args.in_path)?;
    let filter = chromaplay::Filter::parse(&args.filter)?;
    let mut surface = PixelSurface::new(
        args.width.unwrap_or(frame.width),
        args.height.unwrap_or(frame.height),
    );

    let mut scratch = Vec::new();
    let outcome = chromaplay::run_iteration(Some(&frame), filter, &mut surface, &mut scratch);
    if outcome != IterationOutcome::Rendered {
        anyhow::bail!("frame was not rendered: {outcome:?}");
    }

    ensure_parent(&args.out)?;
    surface.save_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn read_script(path: &Path) -> anyhow::Result<Vec<TimedIntent>> {
    let f = File::open(path).with_context(|| format!("open script '{}'", path.display()))?;
    let mut script: Vec<TimedIntent> =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse intent script JSON")?;
    script.sort_by(|a, b| a.at.total_cmp(&b.at));
    Ok(script)
}

#[derive(serde::Serialize)]
struct SessionReport {
    snapshot: chromaplay::PlaybackSnapshot,
    frame_loop: chromaplay::FrameLoopStats,
    refreshes: u64,
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let mut cfg = match &args.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };
    if let Some(name) = &args.filter {
        cfg.filter = chromaplay::Filter::parse(name)?;
    }
    anyhow::ensure!(
        args.seconds.is_finite() && args.seconds >= 0.0,
        "--seconds must be finite and >= 0"
    );

    let script = match &args.script {
        Some(path) => read_script(path)?,
        None => Vec::new(),
    };
    let media = match &args.still {
        Some(path) => SimulatedMedia::with_still_frame(cfg.media.clone(), read_frame(path)?),
        None => SimulatedMedia::new(cfg.media.clone()),
    };
    let controller = cfg.controller::<SimulatedMedia>()?;
    let surface = PixelSurface::new(cfg.surface_width, cfg.surface_height);

    let (report, surface) = if args.realtime {
        let mut player = Player::new(controller, IntervalScheduler::new(cfg.fps), surface);
        let report = run_session(
            &mut player,
            media,
            &script,
            args.seconds,
            cfg.fps,
            |s: &mut IntervalScheduler| s.wait_for_tick(),
        );
        (report, player.surface().clone())
    } else {
        let mut player = Player::new(controller, ManualScheduler::new(), surface);
        let report = run_session(
            &mut player,
            media,
            &script,
            args.seconds,
            cfg.fps,
            |s: &mut ManualScheduler| s.take_due(),
        );
        (report, player.surface().clone())
    };

    if let Some(out) = &args.out {
        ensure_parent(out)?;
        surface.save_png(out)?;
        eprintln!("wrote {}", out.display());
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_session<S: FrameScheduler>(
    player: &mut Player<SimulatedMedia, S, PixelSurface>,
    media: SimulatedMedia,
    script: &[TimedIntent],
    seconds: f64,
    fps: u32,
    mut next_due: impl FnMut(&mut S) -> Vec<FrameRequestId>,
) -> SessionReport {
    let dt = 1.0 / f64::from(fps.max(1));
    let refreshes = (seconds * f64::from(fps.max(1))).ceil() as u64;
    let mut pending = script.iter().peekable();

    player.mount(media);
    for i in 0..refreshes {
        let clock = i as f64 * dt;
        while let Some(t) = pending.next_if(|t| t.at <= clock) {
            player.dispatch(t.intent);
        }
        if let Some(m) = player.media_mut() {
            m.advance(dt);
        }
        player.pump();
        let due = next_due(player.scheduler_mut());
        player.fire(due);
    }

    let report = SessionReport {
        snapshot: player.snapshot(),
        frame_loop: player.frame_loop_stats(),
        refreshes,
    };
    player.unmount();
    report
}
