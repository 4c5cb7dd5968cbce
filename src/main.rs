use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use slideshow_maker::{
    composition::{default_output_path, SlideshowEngine},
    config::{Config, OutputSettings},
    effects::EffectRegistry,
    profiles::{ProfileRegistry, SelectionMode},
    slides::{ImageItem, ImageLoader, Project},
    transitions::{Edge, TransitionKind},
    video::{format_time, AspectRatio, Quality},
    SlideshowError,
};

#[derive(Parser)]
#[command(
    name = "slideshow-maker",
    version,
    about = "Turn a folder of photos into an MP4 slideshow",
    long_about = "Slideshow Maker renders images into a video with fade and slide transitions, zoom and pan effects, color grades and overlays."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Render a slideshow to MP4 (or to PNG frames)
    Render {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output_settings: OutputArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Output video path (`.mp4` is appended when missing)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write PNG frames into this directory instead of encoding a video
        #[arg(long)]
        frames_dir: Option<PathBuf>,
    },

    /// Render a single frame to a PNG file
    Preview {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output_settings: OutputArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Timestamp in seconds
        #[arg(short, long, default_value_t = 0.0)]
        time: f64,

        /// PNG file to write
        #[arg(short, long, default_value = "preview.png")]
        output: PathBuf,
    },

    /// Create a project file from images
    Init {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output_settings: OutputArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Project file to write
        #[arg(short, long, default_value = "slideshow.toml")]
        save: PathBuf,
    },

    /// Edit the slides of a project file
    Edit {
        /// Project file to modify
        project: PathBuf,

        #[command(subcommand)]
        action: EditAction,
    },

    /// List transitions, effects, profiles and output presets
    List,

    /// Write the default configuration to a file
    Config {
        #[arg(default_value = "slideshow-config.toml")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum EditAction {
    /// Show the slides with their settings
    Show,

    /// Append images to the end of the show
    Add { images: Vec<PathBuf> },

    /// Remove the slide at a position (1-based)
    Remove { position: usize },

    /// Move a slide one place earlier
    Up { position: usize },

    /// Move a slide one place later
    Down { position: usize },

    /// Change the settings of one slide
    Set {
        position: usize,

        #[arg(long)]
        duration: Option<f64>,

        /// Start transition, e.g. "Fade In" or "slide_left"
        #[arg(long)]
        start: Option<TransitionKind>,

        #[arg(long)]
        start_duration: Option<f64>,

        /// End transition, e.g. "Slide Out Right"
        #[arg(long)]
        end: Option<TransitionKind>,

        #[arg(long)]
        end_duration: Option<f64>,

        /// Effect name, e.g. "Zoom In" or "none"
        #[arg(long)]
        effect: Option<String>,
    },
}

/// Where the slides come from
#[derive(Args)]
struct InputArgs {
    /// Image files, in show order
    images: Vec<PathBuf>,

    /// Use every image in this directory, sorted by name
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Load a saved project file
    #[arg(short, long, conflicts_with_all = ["images", "dir"])]
    project: Option<PathBuf>,
}

/// Overrides for the output settings
#[derive(Args)]
struct OutputArgs {
    /// Aspect ratio (16:9, 4:3, 1:1, 9:16, 21:9)
    #[arg(long)]
    aspect: Option<AspectRatio>,

    /// Frames per second (15-60)
    #[arg(long)]
    fps: Option<u32>,

    /// Share of each start transition overlapping the previous slide (0.0-1.0)
    #[arg(long)]
    overlap: Option<f64>,

    /// Quality preset (low, medium, high, very_high)
    #[arg(long)]
    quality: Option<Quality>,

    /// Seconds each newly added image stays on screen
    #[arg(long)]
    duration: Option<f64>,
}

impl OutputArgs {
    fn apply(&self, output: &mut OutputSettings) {
        if let Some(aspect) = self.aspect {
            output.aspect_ratio = aspect;
        }
        if let Some(fps) = self.fps {
            output.fps = fps;
        }
        if let Some(overlap) = self.overlap {
            output.overlap = overlap;
        }
        if let Some(quality) = self.quality {
            output.quality = quality;
        }
    }
}

/// How transitions and effects are chosen
#[derive(Args)]
struct SelectionArgs {
    /// Selection mode: manual, random or profile
    #[arg(long)]
    mode: Option<String>,

    /// Profile to apply (implies --mode profile)
    #[arg(long)]
    profile: Option<String>,

    /// Seed for random mode (implies --mode random)
    #[arg(long)]
    seed: Option<u64>,
}

impl SelectionArgs {
    fn resolve(&self, current: SelectionMode) -> Result<SelectionMode> {
        if let Some(name) = &self.profile {
            return Ok(SelectionMode::Profile { name: name.clone() });
        }

        match self.mode.as_deref().map(str::to_lowercase).as_deref() {
            None if self.seed.is_some() => Ok(SelectionMode::Random { seed: self.seed }),
            None => Ok(current),
            Some("manual") => Ok(SelectionMode::Manual),
            Some("random") => Ok(SelectionMode::Random { seed: self.seed }),
            Some("profile") => bail!("--mode profile needs --profile <NAME>"),
            Some(other) => bail!("Unknown selection mode: {}", other),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<SlideshowError>() {
            Some(err) => error!("{}", err.user_message()),
            None => error!("{:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting Slideshow Maker v{}", env!("CARGO_PKG_VERSION"));
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Render {
            input,
            output_settings,
            selection,
            output,
            frames_dir,
        } => {
            let project = build_project(&input, &output_settings, &selection, &config)?;
            let engine = SlideshowEngine::new(config);

            let summary = match frames_dir {
                Some(dir) => engine.export_frames(&project, dir).await?,
                None => {
                    let output = output.unwrap_or_else(|| default_output_path(Path::new(".")));
                    engine.render(&project, output).await?
                }
            };

            info!(
                "Done: {} slides, {} frames, {} at {}x{} (~{:.1} MB)",
                summary.slides,
                summary.frame_count,
                format_time(summary.duration),
                summary.resolution.0,
                summary.resolution.1,
                summary.estimated_size_mb
            );
        }

        Command::Preview {
            input,
            output_settings,
            selection,
            time,
            output,
        } => {
            let project = build_project(&input, &output_settings, &selection, &config)?;
            let engine = SlideshowEngine::new(config);

            let frame = engine.preview(&project, time).await?;
            frame
                .save_png(&output)
                .with_context(|| format!("Failed to write preview {:?}", output))?;
            info!("Preview at {:.2}s saved to {:?}", time, output);
        }

        Command::Init {
            input,
            output_settings,
            selection,
            save,
        } => {
            let project = build_project(&input, &output_settings, &selection, &config)?;
            project.validate()?;
            project.save(&save)?;
            info!(
                "Wrote {:?} with {} slides ({})",
                save,
                project.slides.len(),
                format_time(project.duration())
            );
        }

        Command::Edit { project, action } => edit_project(&project, action, &config)?,

        Command::List => print_catalog(),

        Command::Config { path } => {
            Config::default().save_to_file(&path)?;
            info!("Default configuration written to {:?}", path);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Config::from_file(path)?
        }
        None => Config::default(),
    };
    config.validate()?;
    Ok(config)
}

fn build_project(
    input: &InputArgs,
    output_args: &OutputArgs,
    selection: &SelectionArgs,
    config: &Config,
) -> Result<Project> {
    let mut project = match &input.project {
        Some(path) => Project::load(path)?,
        None => {
            let mut images = input.images.clone();
            if let Some(dir) = &input.dir {
                images.extend(ImageLoader::discover(dir)?);
            }
            if images.is_empty() {
                bail!("No images given. Pass image files, --dir <DIR> or --project <FILE>.");
            }

            let mut config = config.clone();
            if let Some(duration) = output_args.duration {
                config.defaults.duration = duration;
            }
            Project::from_images(images, &config)
        }
    };

    output_args.apply(&mut project.output);
    project.mode = selection.resolve(project.mode.clone())?;
    Ok(project)
}

fn edit_project(path: &Path, action: EditAction, config: &Config) -> Result<()> {
    let mut project = Project::load(path)?;

    if let EditAction::Show = action {
        for (i, item) in project.slides.iter().enumerate() {
            println!(
                "{:>3}. {:<40} {:>5.1}s  {} ({:.1}s) -> {} ({:.1}s)  effect: {}  overlay: {}",
                i + 1,
                item.file_name(),
                item.duration,
                item.start_transition.label(Edge::Start),
                item.start_duration,
                item.end_transition.label(Edge::End),
                item.end_duration,
                item.effect,
                item.overlay.describe()
            );
        }
        println!(
            "{} slides, {} total, mode {}",
            project.slides.len(),
            format_time(project.duration()),
            project.mode
        );
        return Ok(());
    }

    let slides = &mut project.slides;

    let index = |position: usize| -> Result<usize> {
        if position == 0 {
            bail!("Positions start at 1");
        }
        Ok(position - 1)
    };

    match action {
        EditAction::Show => {}
        EditAction::Add { images } => {
            for image in images {
                if !ImageLoader::is_valid_image_file(&image) {
                    bail!("Not a supported image file: {:?}", image);
                }
                slides.add(ImageItem::with_defaults(image, &config.defaults));
            }
        }
        EditAction::Remove { position } => {
            let removed = slides.remove(index(position)?)?;
            info!("Removed {}", removed);
        }
        EditAction::Up { position } => {
            if !slides.move_up(index(position)?) {
                info!("Slide {} is already first", position);
            }
        }
        EditAction::Down { position } => {
            if !slides.move_down(index(position)?) {
                info!("Slide {} is already last", position);
            }
        }
        EditAction::Set {
            position,
            duration,
            start,
            start_duration,
            end,
            end_duration,
            effect,
        } => {
            let len = slides.len();
            let item = slides
                .get_mut(index(position)?)
                .with_context(|| format!("No slide at position {} ({} slides)", position, len))?;

            if let Some(duration) = duration {
                item.duration = duration;
            }
            if let Some(kind) = start {
                item.start_transition = kind;
            }
            if let Some(seconds) = start_duration {
                item.start_duration = seconds;
            }
            if let Some(kind) = end {
                item.end_transition = kind;
            }
            if let Some(seconds) = end_duration {
                item.end_duration = seconds;
            }
            if let Some(effect) = effect {
                if !EffectRegistry::new().is_known(&effect) {
                    bail!("Unknown effect: {}", effect);
                }
                item.effect = effect;
            }
            item.validate()?;
        }
    }

    project.save(path)?;
    info!("Saved {:?} ({} slides)", path, project.slides.len());
    Ok(())
}

fn print_catalog() {
    println!("Transitions:");
    for kind in TransitionKind::all() {
        println!("  {:<14} {} / {}", kind, kind.label(Edge::Start), kind.label(Edge::End));
    }

    println!("\nEffects:");
    let effects = EffectRegistry::new();
    for name in effects.available_effects() {
        if let Some(effect) = effects.get_effect(&name) {
            println!("  {:<18} {}", name, effect.description());
            for (parameter, description) in effect.metadata().optional_parameters {
                println!("  {:<18}   {}: {}", "", parameter, description);
            }
        }
    }

    println!("\nProfiles:");
    for profile in ProfileRegistry::new().iter() {
        println!("  {:<14} {}", profile.name, profile.description);
    }

    println!("\nAspect ratios:");
    for aspect in AspectRatio::ALL {
        let (w, h) = aspect.dimensions(1080);
        println!("  {:<6} {}x{}", aspect, w, h);
    }

    println!("\nQuality presets:");
    for quality in Quality::ALL {
        println!("  {:<10} {} kbps", quality, quality.bitrate_kbps());
    }
}
