//! Debug error logging.

use std::ffi::OsStr;

use log::LevelFilter;

/// Sets the internal logger, changing the log level based on the value of an
/// environment variable (GITHUB520_DEBUG) or the `--verbose` flag.
pub fn configure<T: AsRef<OsStr>>(ev: Option<T>, verbose: bool) {
    let value: Option<&OsStr> = ev.as_ref().map(AsRef::as_ref);

    // a second call (tests) keeps the first logger
    let _ = env_logger::Builder::new()
        .filter_level(level(value, verbose))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

/// `1` or `debug` turn on debug output, `trace` everything; any other value
/// leaves only warnings unless `--verbose` is given.
fn level(value: Option<&OsStr>, verbose: bool) -> LevelFilter {
    match value.and_then(OsStr::to_str) {
        Some("trace") => LevelFilter::Trace,
        Some("1" | "debug") => LevelFilter::Debug,
        _ if verbose => LevelFilter::Debug,
        _ => LevelFilter::Warn,
    }
}
