use std::io::Write;

use env_logger::Builder;
use log::{LevelFilter, debug};

/// Initialise `env_logger` for the command line tools.
///
/// `RUST_LOG` wins when set. Otherwise this crate logs at `Info` (or `Debug`
/// when `verbose`) and everything else at `Warn`.
pub fn setup_logger(verbose: bool) {
    let mut builder = Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    } else {
        let level = if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        builder.filter(None, LevelFilter::Warn);
        builder.filter(Some("cocorecord"), level);
    }

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] {}",
            buf.timestamp_millis(),
            record.level(),
            record.args()
        )
    });

    // A second call (e.g. from tests) keeps the first logger.
    if let Err(e) = builder.try_init() {
        debug!("Logger already initialised: {e}");
    }
}
