use tracing_subscriber::filter::ParseError;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

const CRATES: [&str; 5] = ["sf_cli", "sf_routing", "sf_project", "sf_balance", "sf_network"];

pub fn setup_tracing(debug: bool) -> Result<(), ParseError> {
    let level = if debug { "debug" } else { "info" };

    let mut filter = EnvFilter::from_default_env();
    for name in CRATES {
        filter = filter.add_directive(format!("{name}={level}").parse()?);
    }

    let subscriber = Registry::default()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter);

    // a subscriber may already be installed (tests); keep it
    let _ = tracing::subscriber::set_global_default(subscriber);
    Ok(())
}
