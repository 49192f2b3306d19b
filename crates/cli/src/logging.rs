// Logging, powered by tracing-subscriber
//
// Events go to stderr so stdout stays clean for --json.
// RUST_LOG, when set, replaces the computed filter entirely.

use tracing_subscriber::EnvFilter;

/// Crates whose debug output drowns ours.
const NOISY: &[(&str, &str)] = &[
    ("reqwest", "warn"),
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("rustls", "warn"),
    ("arrow", "warn"),
];

/// Filter directives for the chosen verbosity.
pub fn filter_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let mut directives = vec![level.to_string()];
    for (target, lvl) in NOISY {
        directives.push(format!("{}={}", target, lvl));
    }
    directives.join(",")
}

/// Install the global subscriber. Safe to call once per process.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
