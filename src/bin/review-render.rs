use std::{
    path::{Path, PathBuf},
    rc::Rc,
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use review_render::{
    AnnotationSet, Canvas, CpuSurface, Dispatcher, PageConfig, RenderPage, SystemClock,
    digest::{self, DigestJob, DigestSettings},
    encode::{FfmpegEncoder, FrameSink, PngSequenceSink, default_mp4_config},
    foundation::clock::ManualClock,
    headless_viewers, render_annotation_set, timecode,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "review-render", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the SMPTE timecode and display frame of a playback time.
    Timecode(TimecodeArgs),
    /// Render an annotation set to a PNG.
    Annotate(AnnotateArgs),
    /// Run the render page protocol over stdin/stdout.
    Serve(ServeArgs),
    /// Render a digest video (requires `ffmpeg` on PATH unless `--frames-dir` is given).
    Digest(DigestArgs),
}

#[derive(Parser, Debug)]
struct TimecodeArgs {
    /// Playback time in seconds.
    #[arg(long, allow_negative_numbers = true)]
    time: f64,

    /// Frame rate.
    #[arg(long)]
    fps: f64,

    /// Frame number of the first frame.
    #[arg(long, default_value_t = 0)]
    start_frame: i64,
}

#[derive(Parser, Debug)]
struct AnnotateArgs {
    /// Annotation JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Reveal progress in `0..=1`.
    #[arg(long, default_value_t = 1.0)]
    progress: f64,

    /// Font for text shapes.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Directory relative asset sources resolve against.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Font for annotation text and the comment overlay.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct DigestArgs {
    /// Digest job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Directory relative asset sources resolve against (defaults to the job's directory).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Digest settings JSON.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Font for annotation text and the comment overlay.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Write a PNG sequence here instead of encoding a video.
    #[arg(long)]
    frames_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Timecode(args) => cmd_timecode(args),
        Command::Annotate(args) => cmd_annotate(args),
        Command::Serve(args) => cmd_serve(args),
        Command::Digest(args) => cmd_digest(args),
    }
}

fn cmd_timecode(args: TimecodeArgs) -> anyhow::Result<()> {
    let smpte = timecode::format_smpte(args.time, args.fps, args.start_frame);
    let frame = timecode::calculate_current_frame(args.time, args.fps, args.start_frame);
    println!("{smpte} frame {frame}");
    Ok(())
}

fn read_font(path: &Path) -> anyhow::Result<Arc<Vec<u8>>> {
    let bytes = std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
    Ok(Arc::new(bytes))
}

fn cmd_annotate(args: AnnotateArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read annotation '{}'", args.in_path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| "parse annotation JSON")?;
    let set = AnnotationSet::from_value(&value)?;

    let canvas = Canvas::new(args.width, args.height)?;
    let mut surface = CpuSurface::new(canvas)?;
    if let Some(font) = &args.font {
        surface = surface.with_font(read_font(font)?)?;
    }
    render_annotation_set(&mut surface, &set, args.progress)?;
    surface
        .snapshot()
        .save_png(&args.out)
        .with_context(|| format!("write '{}'", args.out.display()))?;

    tracing::info!(shapes = set.shapes.len(), out = %args.out.display(), "annotation rendered");
    Ok(())
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = PageConfig::from_env();
    if args.assets.is_some() {
        config.assets_root = args.assets;
    }
    if args.font.is_some() {
        config.font_path = args.font;
    }

    let viewers = headless_viewers(config.assets_root.clone());
    let page = RenderPage::new(config, viewers, SystemClock::new());
    let mut dispatcher = Dispatcher::new(page);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let stats = review_render::serve(&mut dispatcher, stdin.lock(), stdout.lock())?;
    tracing::info!(
        messages = stats.messages,
        errors = stats.errors,
        "protocol session ended"
    );
    Ok(())
}

fn cmd_digest(args: DigestArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read digest job '{}'", args.in_path.display()))?;
    let job = DigestJob::from_json(&text).with_context(|| "parse digest job")?;
    if !job.is_renderable() {
        tracing::warn!("digest has no comments; no video written");
        return Ok(());
    }

    let settings = match &args.settings {
        Some(path) => {
            let s = std::fs::read_to_string(path)
                .with_context(|| format!("read digest settings '{}'", path.display()))?;
            DigestSettings::from_json(&s).with_context(|| "parse digest settings")?
        }
        None => DigestSettings::default(),
    };
    let timing = settings.resolve()?;

    let assets_root = args.assets.clone().or_else(|| {
        args.in_path
            .parent()
            .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
            .map(Path::to_path_buf)
    });
    let mut config = PageConfig::from_env();
    config.canvas = timing.canvas;
    config.assets_root = assets_root.clone();
    if args.font.is_some() {
        config.font_path = args.font.clone();
    }

    // Waits only pace the captures; the clock does not need to follow wall time.
    let mut page = RenderPage::new(
        config,
        headless_viewers(assets_root),
        Rc::new(ManualClock::new()),
    );

    let planned = digest::planned_frames(&job, &timing);
    tracing::info!(
        items = job.items.len(),
        comments = job.comment_count(),
        planned_frames = planned,
        fps = timing.fps,
        "rendering digest"
    );

    if let Some(dir) = &args.frames_dir {
        let mut sink = PngSequenceSink::create(dir)?;
        let report = digest::render_digest(&mut page, &job, &timing, &mut sink)?;
        println!(
            "wrote {} frames to {}",
            sink.frames_written(),
            sink.dir().display()
        );
        anyhow::ensure!(report.frames > 0, "no digest item could be rendered");
        return Ok(());
    }

    let cfg = default_mp4_config(
        &args.out,
        timing.canvas.width,
        timing.canvas.height,
        timing.fps,
    )
    .with_planned_frames(planned);
    let bg = page.config().background.to_premul().to_array();
    let mut encoder = FfmpegEncoder::new(cfg, bg)?;
    let report = match digest::render_digest(&mut page, &job, &timing, &mut encoder) {
        Ok(report) if report.frames > 0 => report,
        Ok(_) => {
            encoder.abort();
            anyhow::bail!("no digest item could be rendered");
        }
        Err(e) => {
            encoder.abort();
            return Err(e.into());
        }
    };
    let size = encoder.finish()?;

    println!(
        "wrote {} ({} frames, {:.2} MiB)",
        args.out.display(),
        report.frames,
        size as f64 / (1024.0 * 1024.0)
    );
    Ok(())
}
