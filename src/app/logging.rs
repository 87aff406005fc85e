use super::config::LogFormat;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {source}")]
    Filter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("Failed to set global tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Directives applied when `RUST_LOG` is not set.
pub fn build_filter_string(debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    format!("{level},rayon=warn")
}

/// Installs the global subscriber. Events go to stderr so that the timing
/// report on stdout stays machine readable.
pub fn init_logging(debug: bool, format: LogFormat) -> Result<(), LoggingError> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(value) if !value.is_empty() => value,
        _ => build_filter_string(debug),
    };
    let env_filter = EnvFilter::try_new(&filter).map_err(|source| LoggingError::Filter {
        filter: filter.clone(),
        source,
    })?;

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_raises_the_default_level() {
        assert_eq!(build_filter_string(false), "info,rayon=warn");
        assert_eq!(build_filter_string(true), "debug,rayon=warn");
    }

    #[test]
    fn default_filters_parse() {
        assert!(EnvFilter::try_new(build_filter_string(true)).is_ok());
        assert!(EnvFilter::try_new(build_filter_string(false)).is_ok());
    }
}
