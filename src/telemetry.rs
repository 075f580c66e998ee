use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::AppConfig;

const QUIET_FILTER: &str = "info";
const VERBOSE_FILTER: &str = "debug";

/// Filter applied when `RUST_LOG` is unset: `--verbose`, then the saved
/// `log_filter`, then `info`.
pub fn fallback_filter(verbose: bool, configured: Option<&str>) -> String {
    if verbose {
        return VERBOSE_FILTER.to_string();
    }
    configured
        .map(str::trim)
        .filter(|filter| !filter.is_empty())
        .unwrap_or(QUIET_FILTER)
        .to_string()
}

/// Install the stderr subscriber for a CLI run. A second call is a no-op.
pub fn init_tracing(config: &AppConfig, verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(fallback_filter(verbose, config.log_filter.as_deref()))
    });
    let output = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let output = if json {
        output.json().boxed()
    } else {
        output.boxed()
    };
    if tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
}
