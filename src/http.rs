//! Request and response values passed between pages, the cache and the network
//!
//! A `RequestKey` is the identity used for cache matching: the upper-cased
//! method plus the normalized absolute URL with any fragment removed.

use crate::error::{PrecacheError, PrecacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Outgoing resource request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// HTTP method, upper-cased
    pub method: String,

    /// Absolute URL
    pub url: String,

    /// Request headers in send order
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Create a request with an explicit method
    pub fn new(method: impl AsRef<str>, url: impl Into<String>) -> Self {
        Self {
            method: method.as_ref().to_ascii_uppercase(),
            url: url.into(),
            headers: vec![],
        }
    }

    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Cache identity of this request
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

/// Normalized request identity used as the cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    /// Build an identity, normalizing the URL the way a browser does
    /// before matching. Unparseable URLs are kept verbatim minus the fragment.
    pub fn new(method: &str, url: &str) -> Self {
        let url = match Url::parse(url) {
            Ok(mut parsed) => {
                parsed.set_fragment(None);
                String::from(parsed)
            }
            Err(_) => url.split('#').next().unwrap_or_default().to_string(),
        };
        Self {
            method: method.to_ascii_uppercase(),
            url,
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Response as produced by the network and stored in a cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code
    pub status: u16,

    /// Reason phrase, if the server or status code provides one
    #[serde(default)]
    pub status_text: String,

    /// Response headers in received order
    #[serde(default)]
    pub headers: Vec<(String, String)>,

    /// Response body, hex encoded when serialized
    #[serde(with = "hex_body")]
    pub body: Vec<u8>,

    /// Final URL of the response
    pub url: String,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: vec![],
            body: body.into(),
            url: url.into(),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

mod hex_body {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

fn invalid_url(url: &str, reason: impl ToString) -> PrecacheError {
    PrecacheError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Check that `url` is an absolute http(s) URL
pub fn validate_absolute(url: &str) -> PrecacheResult<()> {
    let parsed = Url::parse(url).map_err(|e| invalid_url(url, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid_url(url, format!("unsupported scheme '{}'", scheme))),
    }
}

/// Resolve a resource identifier against the scope URL.
///
/// Follows browser resolution: absolute identifiers stand alone, `/path`
/// is origin-relative, `?query` and `#fragment` keep the scope's path and
/// anything else is relative to the scope's directory.
pub fn resolve_url(scope: &str, reference: &str) -> PrecacheResult<String> {
    let base = Url::parse(scope).map_err(|e| invalid_url(scope, e))?;
    let resolved = base.join(reference).map_err(|e| invalid_url(reference, e))?;
    Ok(resolved.into())
}
