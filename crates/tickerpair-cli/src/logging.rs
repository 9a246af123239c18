use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directives(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "tickerpair_core=warn,tickerpair_cli=warn",
        1 => "tickerpair_core=debug,tickerpair_cli=debug",
        _ => "tickerpair_core=trace,tickerpair_cli=trace",
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays machine-readable.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: a tracing subscriber was already installed");
    }
}
