use slawatch_core::config::LoggingConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter variable checked before `RUST_LOG`.
pub const ENV_LOG_FILTER: &str = "SLAWATCH_LOG";

/// Installs the global subscriber. Output goes to stderr.
///
/// The filter comes from `SLAWATCH_LOG` (or `RUST_LOG`), falling back to
/// `logging.level`. `logging.format` picks console or JSON lines.
pub fn init_logging(logging: &LoggingConfig) -> Result<(), String> {
    let filter = EnvFilter::try_from_env(ENV_LOG_FILTER)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(logging.level.trim()));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    let installed = if is_json(&logging.format) {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| format!("initialize logging: {err}"))
}

fn is_json(format: &str) -> bool {
    format.trim().eq_ignore_ascii_case("json")
}

#[cfg(test)]
mod tests {
    use super::is_json;

    #[test]
    fn format_selection() {
        assert!(is_json("json"));
        assert!(is_json(" JSON "));
        assert!(!is_json("console"));
    }
}
