use std::env;
use std::time::Duration;

use super::error::ForwardError;

/// Plugin API endpoint used when no URL is configured.
pub const DEFAULT_URL: &'static str = "https://platform-api.newrelic.com/platform/v1/metrics";

/// Plugin identifier used when no GUID is configured.
pub const DEFAULT_GUID: &'static str = "com.influxdata.telegraf";

/// Settings read once when a forwarder connects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub url: Option<String>,
    pub license: String,
    pub guid: Option<String>,
    /// Passed to the HTTP client. `None` keeps the client's own default.
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn new<S: AsRef<str>>(license: S) -> Config {
        Config {
            license: license.as_ref().to_owned(),
            ..Config::default()
        }
    }

    pub fn with_url<S: AsRef<str>>(mut self, url: S) -> Config {
        self.url = Some(url.as_ref().to_owned());
        self
    }

    pub fn with_guid<S: AsRef<str>>(mut self, guid: S) -> Config {
        self.guid = Some(guid.as_ref().to_owned());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Config {
        self.timeout = Some(timeout);
        self
    }

    /// Reads `NEWRELIC_LICENSE_KEY`, `NEWRELIC_URL`, `NEWRELIC_GUID` and
    /// `NEWRELIC_TIMEOUT_SECS`. A missing license is reported by `connect`,
    /// not here.
    pub fn from_env() -> Result<Config, ForwardError> {
        let mut config = Config::new(env::var("NEWRELIC_LICENSE_KEY").unwrap_or_default());

        config.url = non_empty_var("NEWRELIC_URL");
        config.guid = non_empty_var("NEWRELIC_GUID");

        if let Some(secs) = non_empty_var("NEWRELIC_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                ForwardError::Config(format!("NEWRELIC_TIMEOUT_SECS must be a whole number of seconds, got {:?}", secs))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Configured URL, or the public Plugin API.
    pub fn url(&self) -> &str {
        match self.url {
            Some(ref url) if !url.is_empty() => url.as_str(),
            _ => DEFAULT_URL,
        }
    }

    /// Configured GUID, or the default plugin identifier.
    pub fn guid(&self) -> &str {
        match self.guid {
            Some(ref guid) if !guid.is_empty() => guid.as_str(),
            _ => DEFAULT_GUID,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}
