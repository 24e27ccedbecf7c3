//! DoH JSON resolution with EDNS Client Subnet hints.
//!
//! A query is an HTTP GET against the endpoint with `name`, `type` and
//! `edns_client_subnet` parameters. The response is the JSON shape served by
//! the common public resolvers:
//!
//! ```text
//! { "Answer": [ { "type": 1, "data": "1.2.3.4" }, ... ] }
//! ```
//!
//! Transport failures are retried immediately up to the attempt budget. A body
//! that cannot be parsed is never retried and surfaces as [`Resolution::Fatal`].

use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::error::{ParseError, TransportError};

const MAX_REDIRECTS: usize = 4;
const DNS_JSON: &str = "application/dns-json";

/// Numeric DNS record type, e.g. `1` for A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordType(pub u16);

impl RecordType {
    pub const A: RecordType = RecordType(1);
}

impl Default for RecordType {
    fn default() -> Self {
        Self::A
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What to ask an endpoint: one name, one type, from one subnet.
#[derive(Debug, Clone, Copy)]
pub struct DohQuery<'a> {
    pub domain: &'a str,
    pub subnet: &'a str,
    pub record_type: RecordType,
}

/// Build the request URL for `query`, keeping any parameters already on
/// `endpoint`.
pub fn doh_url(endpoint: &Url, query: &DohQuery<'_>) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("name", query.domain)
        .append_pair("type", &query.record_type.to_string())
        .append_pair("edns_client_subnet", query.subnet);
    url
}

/// Fetches the raw response body for one attempt.
pub trait Transport: Send + Sync {
    fn fetch(&self, endpoint: &Url, query: &DohQuery<'_>) -> Result<String, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn fetch(&self, endpoint: &Url, query: &DohQuery<'_>) -> Result<String, TransportError> {
        (**self).fetch(endpoint, query)
    }
}

/// Per-attempt time limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Timeouts {
    pub fn uniform(limit: Duration) -> Self {
        Self {
            connect: limit,
            read: limit,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::uniform(Duration::from_secs(7))
    }
}

/// Blocking HTTP transport shared by all workers.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeouts: Timeouts) -> Result<Self, TransportError> {
        Ok(Self::from_client(client_builder(timeouts).build()?))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

/// Client settings used by [`HttpTransport::new`].
pub fn client_builder(timeouts: Timeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.connect.saturating_add(timeouts.read))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
}

impl Transport for HttpTransport {
    fn fetch(&self, endpoint: &Url, query: &DohQuery<'_>) -> Result<String, TransportError> {
        let response = self
            .client
            .get(doh_url(endpoint, query))
            .header(ACCEPT, DNS_JSON)
            .send()?
            .error_for_status()?;
        Ok(response.text()?)
    }
}

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Answer", default)]
    answer: Option<Value>,
}

/// Pull the `data` of every answer whose `type` matches `record_type`, in
/// response order.
pub fn parse_answers(body: &str, record_type: RecordType) -> Result<Vec<String>, ParseError> {
    let response: DohResponse = serde_json::from_str(body)?;
    let answers = match response.answer {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(answers)) => answers,
        Some(_) => return Err(ParseError::AnswerNotArray),
    };

    let wanted = record_type.to_string();
    Ok(answers
        .iter()
        .filter_map(|answer| {
            let answer = answer.as_object()?;
            let answer_type = answer.get("type").map(value_text)?;
            if answer_type != wanted {
                return None;
            }
            answer.get("data").map(value_text)
        })
        .collect())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Outcome of resolving one query against one endpoint.
#[derive(Debug)]
pub enum Resolution {
    /// A response arrived; the list may be empty when there is no matching
    /// answer.
    Answered(Vec<String>),
    /// Every attempt failed at the transport layer.
    Exhausted {
        attempts: u32,
        last_error: Option<TransportError>,
    },
    /// The response body could not be parsed.
    Fatal(ParseError),
}

pub struct Resolver<T> {
    transport: T,
    max_attempts: u32,
}

impl<T: Transport> Resolver<T> {
    /// `max_attempts` below 1 is raised to 1.
    pub fn new(transport: T, max_attempts: u32) -> Self {
        Self {
            transport,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn resolve(&self, endpoint: &Url, query: &DohQuery<'_>) -> Resolution {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match self.transport.fetch(endpoint, query) {
                Ok(body) => {
                    return match parse_answers(&body, query.record_type) {
                        Ok(ips) => Resolution::Answered(ips),
                        Err(e) => Resolution::Fatal(e),
                    };
                }
                Err(e) => {
                    warn!(
                        action = "retry",
                        component = "resolver",
                        endpoint = %endpoint,
                        domain = query.domain,
                        subnet = query.subnet,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "DoH request failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Resolution::Exhausted {
            attempts: self.max_attempts,
            last_error,
        }
    }
}
