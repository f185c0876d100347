use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use cocorecord::config::DEFAULT_EXTENSION;
use cocorecord::logging::setup_logger;
use cocorecord::shard::list_shards;
use cocorecord::{Compression, DecoderConfig, open_shard};

/// Print the first records of a TFRecord shard.
#[derive(Debug, Parser)]
#[command(name = "cocorecord-decode", version)]
struct Args {
    /// Shard file, or a directory whose lowest-numbered shard is read.
    shard: PathBuf,

    /// Number of records to print.
    #[arg(short = 'k', long, default_value_t = 1)]
    take: usize,

    /// none, gzip or zlib; must match how the shard was written.
    #[arg(short, long, default_value = "none")]
    compression: String,

    /// Shard extension used when `shard` is a directory.
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    extension: String,

    /// Skip CRC verification of record framing.
    #[arg(long)]
    no_verify: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose);

    let path = if args.shard.is_dir() {
        match list_shards(&args.shard, &args.extension)?.into_iter().next() {
            Some(path) => path,
            None => bail!("no .{} shards in {}", args.extension, args.shard.display()),
        }
    } else {
        args.shard.clone()
    };

    let config = DecoderConfig {
        compression: args.compression.parse::<Compression>()?,
        verify_checksums: !args.no_verify,
    };

    let reader = open_shard(&path, &config)
        .with_context(|| format!("failed to open {}", path.display()))?;
    for (i, sample) in reader.take(args.take).enumerate() {
        let sample = sample.with_context(|| format!("record {i} of {}", path.display()))?;
        println!("{sample}\n");
    }
    Ok(())
}
