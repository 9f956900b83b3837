//! Tracing initialisation for binaries.

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the gameday crates log at `level`
/// and everything else at `warn`.
///
/// # Panics
/// If a global subscriber is already installed.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn filter_directives(level: &str) -> String {
    ["gameday", "gameday_core", "gameday_identity", "gameday_competition", "gameday_schedule"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .chain(std::iter::once("warn".to_owned()))
        .collect::<Vec<_>>()
        .join(",")
}
