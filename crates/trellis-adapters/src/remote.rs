//! HTTP source for remote add-on descriptors.
//!
//! A remote add-on is a single JSON document with the same shape as a local
//! add-on after loading (files inlined, binary files as `base64::` payloads).
//! The URL becomes the add-on's id.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument};

use trellis_core::{
    application::{ApplicationError, ports::RemoteAddOnSource},
    domain::{AddOn, DomainValidator},
    error::{TrellisError, TrellisResult},
};

const USER_AGENT: &str = concat!("trellis/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Blocking HTTP fetcher. No caching, no retries.
pub struct HttpAddOnSource {
    client: reqwest::blocking::Client,
}

impl HttpAddOnSource {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self { client }
    }
}

impl Default for HttpAddOnSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteAddOnSource for HttpAddOnSource {
    #[instrument(skip(self))]
    fn load(&self, url: &str) -> TrellisResult<AddOn> {
        let fail = |reason: String| -> TrellisError {
            ApplicationError::RemoteFetch {
                url: url.to_string(),
                reason,
            }
            .into()
        };

        let body: Value = self
            .client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| fail(e.to_string()))?
            .json()
            .map_err(|e| fail(format!("response is not JSON: {e}")))?;

        let add_on = parse_descriptor(url, body).map_err(fail)?;
        debug!(id = %add_on.id, files = add_on.files.len(), "fetched remote add-on");
        Ok(add_on)
    }
}

/// Turn a fetched document into a validated add-on whose id is `url`.
pub fn parse_descriptor(url: &str, mut body: Value) -> Result<AddOn, String> {
    let Value::Object(map) = &mut body else {
        return Err("descriptor must be a JSON object".into());
    };
    map.insert("id".into(), Value::String(url.to_string()));
    if !map.contains_key("name") {
        map.insert("name".into(), Value::String(url.to_string()));
    }

    let add_on: AddOn =
        serde_json::from_value(body).map_err(|e| format!("invalid descriptor: {e}"))?;
    DomainValidator::validate_add_on(&add_on).map_err(|e| e.to_string())?;
    Ok(add_on)
}
