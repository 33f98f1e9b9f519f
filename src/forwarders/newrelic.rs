//! Reports metrics to New Relic through the Plugin API.

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use rustc_serialize::json::{self, Json, ToJson};
use std::collections::BTreeMap;
use std::io;
use std::process;

use super::Forwarder;
use super::super::aggregator::Aggregator;
use super::super::config::Config;
use super::super::error::ForwardError;
use super::super::metrics::{Component, FieldStat, Sample};

/// Version reported in the `agent` block of every request.
pub const AGENT_VERSION: &'static str = "1.0.0";

const MIME_TYPE: &'static str = "application/json";
const LICENSE_HEADER: &'static str = "X-License-Key";

/// Identifies the process doing the reporting. Resolved once at connect.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub host: String,
    pub pid: u32,
    pub version: String,
}

impl Agent {
    pub fn local() -> Result<Agent, ForwardError> {
        let host = hostname().map_err(ForwardError::Hostname)?;

        Ok(Agent {
            host: host,
            pid: process::id(),
            version: AGENT_VERSION.to_owned(),
        })
    }
}

/// Body of one POST: who is reporting and what.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub agent: Agent,
    pub components: Vec<Component>,
}

impl ToJson for FieldStat {
    fn to_json(&self) -> Json {
        let mut object: BTreeMap<String, Json> = BTreeMap::new();

        object.insert("count".to_owned(), self.count.to_json());
        object.insert("total".to_owned(), self.total.to_json());
        object.insert("min".to_owned(), self.min.to_json());
        object.insert("max".to_owned(), self.max.to_json());
        object.insert("sum_of_squares".to_owned(), self.sum_of_squares.to_json());

        Json::Object(object)
    }
}

impl ToJson for Component {
    fn to_json(&self) -> Json {
        let mut object: BTreeMap<String, Json> = BTreeMap::new();

        object.insert("name".to_owned(), self.name.to_json());
        object.insert("guid".to_owned(), self.guid.to_json());
        // The API only accepts the duration as a string.
        object.insert("duration".to_owned(), self.duration.to_string().to_json());
        object.insert("metrics".to_owned(), self.metrics.to_json());

        Json::Object(object)
    }
}

impl ToJson for Agent {
    fn to_json(&self) -> Json {
        let mut object: BTreeMap<String, Json> = BTreeMap::new();

        object.insert("host".to_owned(), self.host.to_json());
        object.insert("pid".to_owned(), self.pid.to_json());
        object.insert("version".to_owned(), self.version.to_json());

        Json::Object(object)
    }
}

impl ToJson for Request {
    fn to_json(&self) -> Json {
        let mut object: BTreeMap<String, Json> = BTreeMap::new();

        object.insert("agent".to_owned(), self.agent.to_json());
        object.insert("components".to_owned(), self.components.to_json());

        Json::Object(object)
    }
}

/// What the Plugin API answers with once it has accepted a POST.
#[derive(Debug, Default, PartialEq)]
pub struct Response {
    pub error: String,
    pub status: String,
}

impl Response {
    /// Missing (or null) keys read as empty strings. Anything that is not an
    /// object of strings is a bad response.
    pub fn parse(body: &str) -> Result<Response, ForwardError> {
        let bad_response = |reason: String| {
            ForwardError::BadResponse { body: body.to_owned(), reason: reason }
        };

        let object = match Json::from_str(body.trim()) {
            Ok(Json::Object(object)) => object,
            Ok(Json::Null) => return Ok(Response::default()),
            Ok(other) => return Err(bad_response(format!("expected an object, got {}", other))),
            Err(error) => return Err(bad_response(error.to_string())),
        };

        let string_field = |key: &str| -> Result<String, ForwardError> {
            match object.get(key) {
                None | Some(&Json::Null) => Ok(String::new()),
                Some(&Json::String(ref value)) => Ok(value.clone()),
                Some(other) => Err(bad_response(format!("expected {:?} to be a string, got {}", key, other))),
            }
        };

        Ok(Response {
            error: string_field("error")?,
            status: string_field("status")?,
        })
    }

    /// Turns a parsed response into the outcome of the write.
    pub fn check(self) -> Result<(), ForwardError> {
        if !self.error.is_empty() {
            return Err(ForwardError::Remote(self.error))
        }
        if self.status != "ok" {
            return Err(ForwardError::StatusNotOk(self.status))
        }

        Ok(())
    }
}

/// Maps an HTTP status to an error before the body is looked at. Anything in
/// `200..=209` is accepted.
pub fn classify_status(status: u16) -> Result<(), ForwardError> {
    match status {
        200..=209 => Ok(()),
        400 | 404 | 405 => Err(ForwardError::VersionMismatch(status)),
        403 => Err(ForwardError::Authentication),
        413 => Err(ForwardError::PayloadTooLarge),
        500 | 502 | 503 | 504 => Err(ForwardError::Unavailable(status)),
        _ => Err(ForwardError::BadStatus(status)),
    }
}

/// Forwards aggregated samples to New Relic via its Plugin API.
///
/// See [their documentation][] for more details.
///
/// [their documentation]: https://docs.newrelic.com/docs/plugins/plugin-developer-resources/developer-reference/work-directly-plugin-api/
pub struct NewRelicForwarder {
    url: String,
    license: String,
    guid: String,
    agent: Agent,
    client: Client,
}

impl NewRelicForwarder {
    /// Validates `config` and resolves the agent identity. No request is made
    /// until the first write.
    pub fn connect(config: Config) -> Result<NewRelicForwarder, ForwardError> {
        if config.license.is_empty() {
            return Err(ForwardError::MissingLicense)
        }

        let agent = Agent::local()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ForwardError::Client)?;

        let forwarder = NewRelicForwarder {
            url: config.url().to_owned(),
            license: config.license.clone(),
            guid: config.guid().to_owned(),
            agent: agent,
            client: client,
        };

        tracing::info!(
            url = %forwarder.url,
            host = %forwarder.agent.host,
            pid = forwarder.agent.pid,
            "connected New Relic forwarder"
        );

        Ok(forwarder)
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Aggregates `samples` into a fresh request. Samples without a `host`
    /// tag are reported under the agent's own host.
    pub fn build_request(&self, samples: &[Sample]) -> Request {
        let aggregator = Aggregator::new(&self.agent.host, &self.guid);

        Request {
            agent: self.agent.clone(),
            components: aggregator.build(samples),
        }
    }

    /// Makes exactly one POST attempt for `request`. Nothing is sent when a
    /// statistic is NaN or infinite.
    pub fn send(&self, request: &Request) -> Result<(), ForwardError> {
        check_finite(request)?;

        let body = json::encode(&request.to_json())
            .map_err(|error| ForwardError::Encode(error.to_string()))?;

        tracing::debug!(
            url = %self.url,
            components = request.components.len(),
            bytes = body.len(),
            "posting metrics"
        );

        let res = self.post(body)
            .send()
            .map_err(ForwardError::Transport)?;

        let status = res.status().as_u16();
        classify_status(status)?;

        let text = res.text().map_err(ForwardError::Transport)?;

        Response::parse(&text)?.check()
    }

    fn post(&self, body: String) -> RequestBuilder {
        self.client.post(&self.url)
            .header(CONTENT_TYPE, MIME_TYPE)
            .header(ACCEPT, MIME_TYPE)
            .header(LICENSE_HEADER, self.license.as_str())
            .body(body)
    }
}

/// rustc-serialize writes NaN and infinities as `null`, which the API would
/// take for a missing number.
fn check_finite(request: &Request) -> Result<(), ForwardError> {
    for component in &request.components {
        for (path, stat) in &component.metrics {
            if !stat.is_finite() {
                return Err(ForwardError::Encode(format!("non-finite value for {}", path)))
            }
        }
    }

    Ok(())
}

impl Forwarder for NewRelicForwarder {
    fn write(&self, samples: &[Sample]) -> Result<(), ForwardError> {
        if samples.is_empty() {
            return Ok(())
        }

        let request = self.build_request(samples);

        self.send(&request)
    }
}

#[cfg(unix)]
fn hostname() -> io::Result<String> {
    let mut buf = vec![0u8; 256];
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if ret != 0 {
        return Err(io::Error::last_os_error())
    }

    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    buf.truncate(end);
    if buf.is_empty() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "hostname is empty"))
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(not(unix))]
fn hostname() -> io::Result<String> {
    Ok("unknown".to_owned())
}
