use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where log lines go. The terminal UI owns stdout/stderr while it runs, so
/// interactive sessions log to a file.
#[derive(Debug, Clone, Copy)]
pub enum LogTarget<'a> {
    File(&'a Path),
    Stderr,
}

/// Installs the global subscriber. `RUST_LOG` wins over `debug` when set.
/// Must be called once at startup.
pub fn init_logging(target: LogTarget<'_>, debug: bool) -> std::io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(debug)));
    let registry = tracing_subscriber::registry().with(env_filter);

    match target {
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            registry
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_target(true)
                        .with_ansi(false),
                )
                .init();
        }
        LogTarget::Stderr => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .init(),
    }

    Ok(())
}

const fn default_level(debug: bool) -> &'static str {
    if debug {
        "wastemap=debug,info"
    } else {
        "info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_levels_are_valid_filters() {
        for debug in [true, false] {
            assert!(EnvFilter::try_new(default_level(debug)).is_ok());
        }
    }
}
