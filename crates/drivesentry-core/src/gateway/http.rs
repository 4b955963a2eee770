//! Low-level REST plumbing shared by the gateway endpoints

use crate::error::{Error, GatewayError, Result};
use reqwest::{header, redirect, Client, Method, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one API base URL.
///
/// Every request carries the bearer credential and the API key query
/// parameter. Redirects are never followed; only 2xx is success, anything
/// else maps to [`GatewayError::Upstream`].
pub(crate) struct RestClient {
    http: Client,
    base_url: String,
    api_key: String,
    access_token: String,
}

impl RestClient {
    pub(crate) fn new(base_url: &str, api_key: &str, access_token: &str) -> Result<Self> {
        let http = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::Gateway(GatewayError::Transport(format!(
                    "failed to build HTTP client: {}",
                    e
                )))
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: access_token.to_string(),
        })
    }

    /// Send one request and hand back the raw 2xx response
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<Response> {
        let url = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };

        let mut request = self
            .http
            .request(method, &url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .bearer_auth(&self.access_token)
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!("Failed to send an API request to {}: {}", url, e);
            Error::Gateway(GatewayError::Transport(e.to_string()))
        })?;

        let status = response.status();
        if status.is_success() {
            debug!("Got {} for url {}", status.as_u16(), url);
            Ok(response)
        } else {
            error!(
                "API request to {} failed with status {}",
                url,
                status.as_u16()
            );
            Err(Error::Gateway(GatewayError::Upstream {
                status: status.as_u16(),
            }))
        }
    }

    /// GET a JSON body and deserialize it
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.send(Method::GET, path, query, None).await?;
        Ok(response.json().await?)
    }
}
