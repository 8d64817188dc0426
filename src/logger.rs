use std::str::FromStr;

use log::{LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Initialize the terminal logger.
///
/// The level defaults to `Info` and can be overridden with `GATEWAY_LOG_LEVEL`
/// (`error`, `warn`, `info`, `debug`, `trace`, `off`).
pub fn init() -> Result<(), SetLoggerError> {
    let level = dotenv::var("GATEWAY_LOG_LEVEL")
        .ok()
        .and_then(|s| LevelFilter::from_str(&s).ok())
        .unwrap_or(LevelFilter::Info);

    let config = ConfigBuilder::default()
        // the http stack is chatty on debug
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("rustls")
        .add_filter_ignore_str("reqwest")
        .build();

    TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Auto)
}
