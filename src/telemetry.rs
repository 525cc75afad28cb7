use tracing::metadata::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Environment variable holding an `EnvFilter` directive, e.g.
/// `OUTLINE_LOG=outline::ops=debug`
pub const LOG_ENV_VAR: &str = "OUTLINE_LOG";

/// Install the stderr log subscriber. `verbosity` is the `-v` count and only
/// sets the default level; `OUTLINE_LOG` overrides it.
///
/// Safe to call more than once: later calls leave the first subscriber in
/// place.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_from_verbosity(verbosity).into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(true);

    let _ = Registry::default().with(filter).with(layer).try_init();
}

fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}
