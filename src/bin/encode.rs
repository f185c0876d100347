use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use cocorecord::codecs::jpeg::DEFAULT_JPEG_QUALITY;
use cocorecord::config::{
    DEFAULT_DATASET_ROOT, DEFAULT_EXTENSION, DEFAULT_NUM_SAMPLES, DEFAULT_OUTPUT_DIR,
    dataset_annotations_file, dataset_images_dir,
};
use cocorecord::logging::setup_logger;
use cocorecord::{Compression, EncoderConfig, LocalImageDir, encode_dataset, load_annotations};

/// Convert COCO annotations and images into sharded TFRecord files.
#[derive(Debug, Parser)]
#[command(name = "cocorecord-encode", version)]
struct Args {
    /// Dataset root containing `val2017/` and `annotations/`.
    #[arg(long, default_value = DEFAULT_DATASET_ROOT)]
    root: PathBuf,

    /// Instances JSON file. Defaults to `<root>/annotations/instances_val2017.json`.
    #[arg(long)]
    annotations: Option<PathBuf>,

    /// Image directory. Defaults to `<root>/val2017`.
    #[arg(long)]
    images: Option<PathBuf>,

    /// Directory the shard files are written to.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Records per shard.
    #[arg(short = 'n', long, default_value_t = DEFAULT_NUM_SAMPLES)]
    num_samples: usize,

    /// JPEG quality used when re-encoding images.
    #[arg(short, long, default_value_t = DEFAULT_JPEG_QUALITY)]
    quality: u8,

    /// none, gzip or zlib.
    #[arg(short, long, default_value = "none")]
    compression: String,

    /// JSON encoder config; replaces --images, --output, --num-samples,
    /// --quality and --compression.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose);

    let config = match &args.config {
        Some(path) => EncoderConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let compression: Compression = args.compression.parse()?;
            EncoderConfig {
                images_dir: args
                    .images
                    .clone()
                    .unwrap_or_else(|| dataset_images_dir(&args.root)),
                output_dir: args.output.clone(),
                num_samples: args.num_samples,
                jpeg_quality: args.quality,
                extension: DEFAULT_EXTENSION.to_string(),
                compression,
            }
        }
    };

    let annotations_path = args
        .annotations
        .clone()
        .unwrap_or_else(|| dataset_annotations_file(&args.root));
    let annotations = load_annotations(&annotations_path)
        .with_context(|| format!("failed to load {}", annotations_path.display()))?;

    let source = LocalImageDir::new(&config.images_dir);
    let summaries = encode_dataset(&config, &annotations, &source)
        .with_context(|| format!("failed to encode into {}", config.output_dir.display()))?;

    info!(
        "Wrote {} shard(s), {} records",
        summaries.len(),
        summaries.iter().map(|s| s.count).sum::<usize>()
    );
    for summary in &summaries {
        println!("{}", summary.path.display());
    }
    Ok(())
}
