// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP transport for the enrollment pages.
//!
//! [`Transport`] performs authenticated GET and POST requests against the
//! server and checks the returned status against the set each method
//! expects. It does not look at response bodies.

use std::borrow::Cow;

use base64::prelude::*;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::tls::TlsInfo;
use reqwest::StatusCode;

use crate::config::{AuthMethod, CertsrvConfig};
use crate::error::{CertsrvError, Result};
use crate::ntlm::{self, Challenge, NtlmCredentials};
use crate::tls::build_http_client;

/// Status codes accepted for GET requests.
pub const GET_EXPECTED: &[StatusCode] = &[StatusCode::OK];

/// Status codes accepted for POST requests.
pub const POST_EXPECTED: &[StatusCode] =
    &[StatusCode::OK, StatusCode::CREATED, StatusCode::NO_CONTENT];

/// Authentication attached to every request, resolved once from the config.
#[derive(Clone)]
pub enum Auth {
    /// Precomputed `Authorization: Basic ...` value.
    Basic(HeaderValue),

    /// NTLM credentials; each request runs its own handshake.
    Ntlm(NtlmCredentials),
}

impl Auth {
    /// Resolve the configured scheme and credentials.
    pub fn from_config(config: &CertsrvConfig) -> Result<Self> {
        let credentials = &config.credentials;
        match config.auth_method {
            AuthMethod::Basic => {
                let encoded = BASE64_STANDARD
                    .encode(format!("{}:{}", credentials.username, credentials.password));
                let mut value = HeaderValue::from_str(&format!("Basic {}", encoded))
                    .map_err(|e| CertsrvError::config(format!("invalid credentials: {}", e)))?;
                value.set_sensitive(true);
                Ok(Self::Basic(value))
            }
            AuthMethod::Ntlm => Ok(Self::Ntlm(NtlmCredentials::from_credentials(credentials))),
        }
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic(_) => write!(f, "Basic(...)"),
            Self::Ntlm(creds) => f.debug_tuple("Ntlm").field(creds).finish(),
        }
    }
}

/// A response read in full, valid for one request/response cycle.
#[derive(Debug, Clone)]
pub struct ResponsePayload {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Vec<u8>,
}

impl ResponsePayload {
    /// Create a payload from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    async fn from_response(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(Self::new(status, headers, body))
    }

    /// Reason phrase of the status code.
    pub fn reason(&self) -> &'static str {
        reason(self.status)
    }

    /// The `Content-Type` header, if present and valid.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Check a status against the set an operation expects.
///
/// Statuses outside 2xx are transport errors; 2xx statuses outside
/// `expected` are unexpected-status errors.
pub fn check_status(status: StatusCode, expected: &[StatusCode]) -> Result<()> {
    if !status.is_success() {
        return Err(CertsrvError::transport(status.as_u16(), reason(status)));
    }

    if !expected.contains(&status) {
        return Err(CertsrvError::unexpected_status(status.as_u16(), reason(status)));
    }

    Ok(())
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// Authenticated HTTP access to the enrollment server.
#[derive(Debug)]
pub struct Transport {
    config: CertsrvConfig,
    http: reqwest::Client,
    auth: Auth,
}

impl Transport {
    /// Create a transport for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS configuration or the credentials are invalid.
    pub fn new(config: CertsrvConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        let auth = Auth::from_config(&config)?;

        Ok(Self { config, http, auth })
    }

    /// Get the configuration.
    pub fn config(&self) -> &CertsrvConfig {
        &self.config
    }

    /// GET `path` with query parameters; only `200` is accepted.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ResponsePayload> {
        let url = self.config.build_url(path);
        tracing::debug!("GET {}", url);

        let response = self.send(|| self.http.get(url.clone()).query(query)).await?;
        tracing::debug!("GET {} -> {}", url, response.status());

        check_status(response.status(), GET_EXPECTED)?;
        ResponsePayload::from_response(response).await
    }

    /// POST a form to `path`; `200`, `201` and `204` are accepted.
    pub async fn post(&self, path: &str, form: &[(&str, String)]) -> Result<ResponsePayload> {
        let url = self.config.build_url(path);
        tracing::debug!("POST {}", url);

        let response = self.send(|| self.http.post(url.clone()).form(form)).await?;
        tracing::debug!("POST {} -> {}", url, response.status());

        check_status(response.status(), POST_EXPECTED)?;
        ResponsePayload::from_response(response).await
    }

    /// Send a request with authentication attached.
    ///
    /// `build` is called once per leg, since NTLM sends the request twice.
    async fn send<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        match &self.auth {
            Auth::Basic(value) => Ok(build().header(AUTHORIZATION, value.clone()).send().await?),
            Auth::Ntlm(credentials) => self.send_ntlm(credentials, build).await,
        }
    }

    async fn send_ntlm<F>(
        &self,
        credentials: &NtlmCredentials,
        build: F,
    ) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let negotiate = ntlm::negotiate_message();
        let response = build()
            .header(AUTHORIZATION, ntlm::header_value(&negotiate))
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = match find_ntlm_challenge(response.headers()) {
            Some(challenge) => challenge?,
            None => {
                tracing::warn!("401 response without an NTLM challenge");
                return Ok(response);
            }
        };

        let channel_binding = response
            .extensions()
            .get::<TlsInfo>()
            .and_then(TlsInfo::peer_certificate)
            .map(ntlm::tls_server_end_point);
        if channel_binding.is_none() {
            tracing::debug!("no TLS peer certificate, sending NTLM without channel binding");
        }

        // The handshake is bound to the connection; drain the body so it is reused.
        response.bytes().await?;

        let authenticate = ntlm::authenticate_message(
            credentials,
            &negotiate,
            &challenge,
            channel_binding.as_deref(),
        )?;
        tracing::debug!("answering NTLM challenge");
        Ok(build()
            .header(AUTHORIZATION, ntlm::header_value(&authenticate))
            .send()
            .await?)
    }
}

fn find_ntlm_challenge(headers: &HeaderMap) -> Option<Result<Challenge>> {
    headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(Challenge::from_header)
}
