use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;

/// Counted `-v` flags mapped to a tracing level; zero keeps logging at the
/// subscriber default.
const fn verbosity_to_level(count: u8) -> Option<tracing::Level> {
    match count {
        0 => None,
        1 => Some(tracing::Level::WARN),
        2 => Some(tracing::Level::INFO),
        3 => Some(tracing::Level::DEBUG),
        _ => Some(tracing::Level::TRACE),
    }
}

/// Parse the command line, bring up logging, and hand back the action the
/// binary should execute.
///
/// # Errors
///
/// Returns an error if argument validation fails or the tracing subscriber
/// cannot be installed.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let verbosity = matches
        .get_one::<u8>(commands::logging::ARG_VERBOSITY)
        .copied()
        .unwrap_or(0);
    telemetry::init(verbosity_to_level(verbosity))?;

    dispatch::handler(&matches)
}
