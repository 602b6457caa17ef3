// ABOUTME: Tracing subscriber setup — stderr output filtered by RUST_LOG or -v flags.
// ABOUTME: Called once from main before anything logs.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive for a `-v` count, used when RUST_LOG is unset.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "threadchat=warn",
        1 => "threadchat=info",
        2 => "threadchat=debug",
        _ => "threadchat=trace",
    }
}

pub fn init(verbosity: u8) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbosity)))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
