//! Aggregates batches of metric samples and forwards them to the New Relic
//! Plugin API.

#[macro_use]
extern crate lazy_static;

extern crate regex;
extern crate rustc_serialize;

pub mod aggregator;
pub mod config;
pub mod error;
pub mod metrics;
pub mod sanitize;

/// Services that aggregated metrics can be shipped to.
pub mod forwarders;

pub use aggregator::Aggregator;
pub use config::Config;
pub use error::ForwardError;
pub use forwarders::Forwarder;
pub use forwarders::newrelic::NewRelicForwarder;
pub use metrics::*;
