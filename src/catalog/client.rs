//! HTTP access to the form API.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use super::CatalogError;
use crate::config::StorefrontConfig;
use crate::domain::value_objects::SourceId;

/// Read endpoints of a form, in the order the pipeline tries them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    PaymentInfo,
    Questions,
    Submissions,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [Self::PaymentInfo, Self::Questions, Self::Submissions];

    pub fn path(&self) -> &'static str {
        match self {
            Self::PaymentInfo => "payment-info",
            Self::Questions => "questions",
            Self::Submissions => "submissions",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.path()) }
}

/// Read side of the form API. Implemented over HTTP by [`FormApiClient`];
/// tests substitute canned payloads.
#[async_trait]
pub trait FormApi: Send + Sync {
    async fn fetch(&self, form: &SourceId, endpoint: Endpoint) -> Result<Value, CatalogError>;
}

#[derive(Clone, Debug)]
pub struct FormApiClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
}

impl FormApiClient {
    /// Every request made through this client carries the configured timeout.
    pub fn new(config: &StorefrontConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self { http, base_url: config.base_url.clone(), api_key: config.api_key.clone() })
    }

    fn form_url(&self, form: &SourceId, endpoint: Endpoint) -> String {
        format!("{}/form/{}/{}", self.base_url, form, endpoint.path())
    }

    /// Posts a url-encoded submission and hands back the raw status and body.
    /// `fields` must already contain the `apiKey` pair.
    pub async fn post_submission(&self, form: &SourceId, fields: &[(String, String)]) -> Result<(StatusCode, String), reqwest::Error> {
        let response = self.http.post(self.form_url(form, Endpoint::Submissions)).form(fields).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    pub(crate) fn api_key(&self) -> &str { self.api_key.expose_secret() }
}

#[async_trait]
impl FormApi for FormApiClient {
    async fn fetch(&self, form: &SourceId, endpoint: Endpoint) -> Result<Value, CatalogError> {
        let url = self.form_url(form, endpoint);
        debug!(form = %form, endpoint = %endpoint, "fetching");

        let response = self.http.get(&url).query(&[("apiKey", self.api_key())]).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status { endpoint, status: status.as_u16() });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| CatalogError::Malformed(format!("{endpoint}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        let paths: Vec<&str> = Endpoint::ALL.iter().map(Endpoint::path).collect();
        assert_eq!(paths, vec!["payment-info", "questions", "submissions"]);
    }

    #[test]
    fn test_form_url() {
        let config = StorefrontConfig::new("https://api.example.com/", "k");
        let client = FormApiClient::new(&config).unwrap();
        let form = SourceId::new("251074098711961").unwrap();
        assert_eq!(client.form_url(&form, Endpoint::Questions), "https://api.example.com/form/251074098711961/questions");
    }
}
