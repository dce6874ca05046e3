use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use subject_lift::compositing::Color;
use subject_lift::output::{FileOutput, OutputSink};
use subject_lift::segmentation::{self, SubjectSegmenter};
use subject_lift::source::FileImageSource;
use subject_lift::{workflow, Image, Point, WorkflowConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Seconds to wait for any single segmentation, blend or lookup
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct SegmenterArgs {
    /// Path to segmentation model (ONNX file)
    /// If not provided, the subject is isolated by chroma key
    #[arg(long)]
    model: Option<PathBuf>,

    /// Key color used when no model is given (name or #rrggbb)
    #[arg(long, default_value = "green")]
    key_color: Color,

    /// RGB distance from the key color treated as background
    #[arg(long, default_value_t = 60.0)]
    key_tolerance: f32,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the background behind the foreground's subject
    Composite {
        /// Image containing the subject
        #[arg(long)]
        foreground: PathBuf,

        /// Replacement background image
        #[arg(long, conflicts_with = "color", required_unless_present = "color")]
        background: Option<PathBuf>,

        /// Replacement background color (red, green, blue, white, gray or #rrggbb)
        #[arg(long)]
        color: Option<Color>,

        /// Where to write the composited image
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        segmenter: SegmenterArgs,
    },

    /// Write the foreground's subject mask as a grayscale image
    Mask {
        #[arg(long)]
        foreground: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        segmenter: SegmenterArgs,
    },

    /// Replay a drag over an image and write the lifted subject
    Lift {
        #[arg(long)]
        image: PathBuf,

        /// Drag path as "x,y;x,y;...": the first point begins the drag
        #[arg(long, value_delimiter = ';', required = true)]
        path: Vec<Point>,

        /// Minimum mask alpha under the pointer to lift a subject
        #[arg(long, default_value_t = 0.5)]
        threshold: f32,

        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        segmenter: SegmenterArgs,
    },
}

impl SegmenterArgs {
    fn build(&self, config: &WorkflowConfig) -> Result<Arc<dyn SubjectSegmenter>> {
        if let Some(model_path) = &self.model {
            tracing::info!("Loading segmentation model from {}", model_path.display());
        }
        let config = WorkflowConfig {
            key_tolerance: self.key_tolerance,
            ..config.clone()
        };
        let segmenter = segmentation::create_segmenter(self.model.as_deref(), self.key_color, &config)
            .context("Failed to create segmenter")?;
        Ok(segmenter)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = WorkflowConfig {
        call_timeout: Duration::from_secs(args.timeout_secs.max(1)),
        ..WorkflowConfig::default()
    };

    tracing::info!("subject-lift starting");

    match args.command {
        Command::Composite {
            foreground,
            background,
            color,
            output,
            segmenter,
        } => {
            let mut source = FileImageSource::new([foreground]);
            if let Some(path) = background {
                source.push(path);
            }
            run_composite(&mut source, color, &segmenter, &config, &output).await
        }
        Command::Mask {
            foreground,
            output,
            segmenter,
        } => {
            let mut source = FileImageSource::new([foreground]);
            run_mask(&mut source, &segmenter, &config, &output).await
        }
        Command::Lift {
            image,
            path,
            threshold,
            output,
            segmenter,
        } => {
            let config = WorkflowConfig {
                lift_threshold: threshold,
                ..config
            };
            let mut source = FileImageSource::new([image]);
            run_lift(&mut source, &path, &segmenter, &config, &output).await
        }
    }
}

fn write(image: &Image, path: &Path, what: &str) -> Result<()> {
    FileOutput::new(path)
        .write_image(image)
        .with_context(|| format!("Failed to write {what}"))
}

async fn run_composite(
    source: &mut FileImageSource,
    color: Option<Color>,
    segmenter: &SegmenterArgs,
    config: &WorkflowConfig,
    output_path: &Path,
) -> Result<()> {
    let output = workflow::composite(source, color, segmenter.build(config)?, config)
        .await
        .context("Compositing failed")?;
    write(&output, output_path, "output")
}

async fn run_mask(
    source: &mut FileImageSource,
    segmenter: &SegmenterArgs,
    config: &WorkflowConfig,
    output_path: &Path,
) -> Result<()> {
    let mask = workflow::extract_mask(source, segmenter.build(config)?, config)
        .await
        .context("Mask extraction failed")?;
    write(&mask, output_path, "mask")
}

async fn run_lift(
    source: &mut FileImageSource,
    path: &[Point],
    segmenter: &SegmenterArgs,
    config: &WorkflowConfig,
    output_path: &Path,
) -> Result<()> {
    let floating = workflow::lift_along(source, path, segmenter.build(config)?, config)
        .await
        .context("Lifting failed")?;
    write(&floating.image, output_path, "lifted subject")
}
