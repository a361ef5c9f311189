/// Installs a `tracing` subscriber that prints to stderr.
///
/// The filter is read from `RUST_LOG` and defaults to `info`. Per-task spans
/// are emitted at `debug`, so `RUST_LOG=lazydag=debug` shows every execution.
/// Returns an error if a global subscriber is already installed.
#[cfg(feature = "logging")]
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()?;

    Ok(())
}
