//! Sends one batch of made-up samples using settings from the environment.
//!
//!     NEWRELIC_LICENSE_KEY=... cargo run --example forward_once

extern crate newrelic_forwarder;

use newrelic_forwarder::{Config, Forwarder, NewRelicForwarder, Sample};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let samples = vec![
        Sample::with_name("cpu")
            .tag("cpu", "cpu-total")
            .field("usage_idle", 92.5)
            .field("usage_user", 4.25),
        Sample::with_name("disk")
            .tag("path", "/")
            .tag("fstype", "ext4")
            .field("used_percent", 41.0)
            .field("inodes_free", 1_204_332u64),
        Sample::with_name("cpu")
            .tag("cpu", "cpu-total")
            .field("usage_idle", 88.0)
            .field("usage_user", 7.5),
    ];

    let result = Config::from_env()
        .and_then(NewRelicForwarder::connect)
        .and_then(|forwarder| forwarder.write(&samples));

    match result {
        Ok(()) => tracing::info!("batch accepted"),
        Err(error) => {
            tracing::error!(%error, "batch rejected");
            std::process::exit(1);
        },
    }
}
