use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

fn timer() -> ChronoLocal {
    ChronoLocal::new(TIMESTAMP_FORMAT.to_string())
}

pub fn open_log(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Plain-text layer writing `YYYY/MM/DD HH:MM:SS message` lines to `file`.
pub fn file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_level(false)
        .with_timer(timer())
}

/// Installs the global subscriber: append-mode log file plus console.
pub fn init(log_file: &Path) -> io::Result<()> {
    let file = open_log(log_file)?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_target(false).with_timer(timer());

    if let Err(error) = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer(file))
        .with(console)
        .try_init()
    {
        eprintln!("global logger initialization failed: {}", error);
    }
    Ok(())
}
