//! `tracing` subscriber setup.
//!
//! Every [`Logbook`](kraken_ecs::log::Logbook) record is mirrored as a
//! `tracing` event with target `kraken::<category>`, so a filter such as
//! `kraken::states=debug,warn` shows state transitions on top of warnings.

use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow::anyhow!("installing tracing subscriber: {err}"))
}
