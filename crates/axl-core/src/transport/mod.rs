//! Transport boundary
//!
//! The dispatcher sees the remote side only through [`AxlTransport`]: hand it a
//! procedure name and a request tree, get back the decoded `<procedureResponse>`
//! element. [`SoapTransport`] is the production implementation over HTTPS;
//! tests substitute a scripted one.

pub mod codec;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::trace;

use crate::config::AxlConfig;
use crate::error::{AxlError, TransportError};
use crate::value::AxlValue;

/// Capability to invoke one AXL procedure
#[async_trait]
pub trait AxlTransport: Send + Sync {
    /// Invoke `procedure` with `request` and return the decoded reply
    async fn invoke(&self, procedure: &str, request: &AxlValue) -> Result<AxlValue, TransportError>;
}

#[async_trait]
impl<T: AxlTransport + ?Sized> AxlTransport for std::sync::Arc<T> {
    async fn invoke(&self, procedure: &str, request: &AxlValue) -> Result<AxlValue, TransportError> {
        (**self).invoke(procedure, request).await
    }
}

/// SOAP over HTTPS transport
pub struct SoapTransport {
    http: reqwest::Client,
    url: String,
    username: String,
    password: String,
    schema_version: String,
}

impl std::fmt::Debug for SoapTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoapTransport")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("schema_version", &self.schema_version)
            .finish()
    }
}

impl SoapTransport {
    /// Build an HTTP client from `config`
    pub fn new(config: &AxlConfig) -> crate::Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| AxlError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            schema_version: config.schema_version.clone(),
        })
    }

    /// `SOAPAction` header value for a procedure
    pub fn soap_action(&self, procedure: &str) -> String {
        format!("\"CUCM:DB ver={} {}\"", self.schema_version, procedure)
    }
}

#[async_trait]
impl AxlTransport for SoapTransport {
    async fn invoke(&self, procedure: &str, request: &AxlValue) -> Result<AxlValue, TransportError> {
        let body = codec::encode_request(procedure, &self.schema_version, request)?;
        trace!("{} request: {}", procedure, body);

        let response = self
            .http
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, HeaderValue::from_static("text/xml; charset=utf-8"))
            .header("SOAPAction", self.soap_action(procedure))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        trace!("{} response ({}): {}", procedure, status, text);

        // AXL reports faults with HTTP 500 and a Fault body; prefer the fault
        match codec::decode_response(&text) {
            Err(fault @ TransportError::Fault { .. }) => Err(fault),
            _ if !status.is_success() => Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            }),
            decoded => decoded,
        }
    }
}
