//! Subscriber setup for the binary; the library only emits events.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `verbosity`: 0 = INFO, 1 = DEBUG, 2+ = TRACE. Without `-v`, a `RUST_LOG`
/// directive for the crate wins over the default level.
pub fn init(verbosity: u8) {
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let mut filter = env_filter.unwrap_or_else(|| EnvFilter::new("warn"));
    if let Some(directive) = crate_directive(verbosity, from_env) {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn crate_directive(verbosity: u8, from_env: bool) -> Option<String> {
    let level = match verbosity {
        0 if from_env => return None,
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    Some(format!("minipack={level}"))
}
