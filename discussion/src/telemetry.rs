use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Env;

/// Installs the global tracing subscriber. `RUST_LOG` controls the filter;
/// production logs are emitted as JSON.
pub fn init(env: &Env) -> Result<(), eyre::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match env {
        Env::Production => registry.with(fmt::layer().json()).try_init(),
        Env::Dev | Env::Staging => registry.with(fmt::layer()).try_init(),
    }
    .map_err(|err| eyre::eyre!("failed to install tracing subscriber: {err}"))
}
