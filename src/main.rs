use camino::Utf8PathBuf;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use pupillometry::constants::LIKELIHOOD_THRESHOLD;
use pupillometry::{BatchRunner, DataLayout, MarkerSpec, RunOptions};

/// Batch pupillometry: fit an ellipse to tracked pupil keypoints, frame by
/// frame, and derive per-frame area alongside the stimulus-marker flag.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Write an annotated copy of each video (<stem>-ellipse.mp4)
    #[arg(short = 'c', long)]
    create_video: bool,

    /// Show a live preview window; press q to abort the current file
    #[arg(short = 's', long)]
    show_video: bool,

    /// Substring selecting the bodypart group to fit
    #[arg(short = 't', long, default_value = "pupil")]
    target_bodypart: String,

    /// Acquisition root holding tracked/, video/, area/ and analyzed/
    #[arg(long, default_value = "data")]
    data_dir: Utf8PathBuf,

    /// Likelihood gate threshold; pairs strictly below are discarded
    #[arg(long, default_value_t = LIKELIHOOD_THRESHOLD)]
    likelihood_threshold: f64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let layout = DataLayout::under(&args.data_dir);
    let options = RunOptions {
        target_bodypart: args.target_bodypart,
        likelihood_threshold: args.likelihood_threshold,
        create_video: args.create_video,
        show_video: args.show_video,
        marker: MarkerSpec::default(),
    };

    match BatchRunner::new(layout, options).run() {
        Ok(summary) => println!("{summary:#}"),
        Err(e) => {
            error!(error = %e, "batch aborted");
            std::process::exit(1);
        }
    }
}
