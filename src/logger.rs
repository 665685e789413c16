use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. `filter` takes `EnvFilter` directives
/// (e.g. `usx_editor=debug`); `RUST_LOG` still applies on top of it.
pub fn init_logging(filter: Option<&str>) {
    let mut env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    if let Some(directive) = filter.and_then(|f| f.parse().ok()) {
        env_filter = env_filter.add_directive(directive);
    }

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(true))
        .with(env_filter)
        .try_init();
}
