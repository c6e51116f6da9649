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

//! Configuration types for the certsrv client.
//!
//! This module provides the configuration used to set up a [`CertsrvClient`],
//! including the server URL, credentials, authentication scheme and TLS trust.
//!
//! [`CertsrvClient`]: crate::CertsrvClient

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CertsrvError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a certsrv client.
#[derive(Clone)]
pub struct CertsrvConfig {
    /// Base URL of the ADCS server (e.g., "https://ca.example.com").
    pub server_url: Url,

    /// Credentials sent to the server.
    pub credentials: Credentials,

    /// Authentication scheme used for every request.
    pub auth_method: AuthMethod,

    /// Trust anchor configuration for server certificate verification.
    pub trust_anchors: TrustAnchors,

    /// Request timeout duration.
    pub timeout: Duration,

    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl std::fmt::Debug for CertsrvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertsrvConfig")
            .field("server_url", &self.server_url)
            .field("username", &self.credentials.username)
            .field("auth_method", &self.auth_method)
            .field("trust_anchors", &self.trust_anchors)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl CertsrvConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CertsrvConfigBuilder {
        CertsrvConfigBuilder::new()
    }

    /// Build the URL of an enrollment page.
    ///
    /// `path` is appended to the server URL path, so a server configured as
    /// `https://ca.example.com/adcs` serves `https://ca.example.com/adcs/certsrv/...`.
    pub fn build_url(&self, path: &str) -> Url {
        let mut url = self.server_url.clone();

        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}/{}", base, path.trim_start_matches('/')));
        url.set_query(None);
        url
    }
}

/// Parse a server address, defaulting to HTTPS when no scheme is given.
pub fn parse_server(server: &str) -> Result<Url, url::ParseError> {
    if server.contains("://") {
        Url::parse(server)
    } else {
        Url::parse(&format!("https://{}", server))
    }
}

/// Builder for [`CertsrvConfig`].
#[derive(Default)]
pub struct CertsrvConfigBuilder {
    server_url: Option<Url>,
    username: Option<String>,
    password: Option<String>,
    auth_method: AuthMethod,
    trust_anchors: Option<TrustAnchors>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl CertsrvConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server, as a host name or a base URL.
    pub fn server(mut self, server: impl AsRef<str>) -> Result<Self, url::ParseError> {
        self.server_url = Some(parse_server(server.as_ref())?);
        Ok(self)
    }

    /// Set the username and password.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the authentication scheme.
    pub fn auth_method(mut self, method: AuthMethod) -> Self {
        self.auth_method = method;
        self
    }

    /// Use the CA certificates in a PEM bundle for server verification.
    pub fn ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.trust_anchors = Some(TrustAnchors::CaFile(path.into()));
        self
    }

    /// Accept any server certificate (insecure, for testing only).
    pub fn trust_any_insecure(mut self) -> Self {
        self.trust_anchors = Some(TrustAnchors::InsecureAcceptAny);
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the server or the credentials are not set.
    pub fn build(self) -> Result<CertsrvConfig, &'static str> {
        let server_url = self.server_url.ok_or("server is required")?;
        let username = self.username.ok_or("username is required")?;
        let password = self.password.ok_or("password is required")?;

        Ok(CertsrvConfig {
            server_url,
            credentials: Credentials { username, password },
            auth_method: self.auth_method,
            trust_anchors: self.trust_anchors.unwrap_or(TrustAnchors::System),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| crate::USER_AGENT.to_string()),
        })
    }
}

/// Username and password for server authentication.
#[derive(Clone)]
pub struct Credentials {
    /// Username. For NTLM this may be given as `DOMAIN\user`.
    pub username: String,

    /// Password.
    pub password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authentication scheme attached to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// HTTP Basic authentication.
    #[default]
    Basic,

    /// NTLMv2 challenge/response authentication.
    Ntlm,
}

impl AuthMethod {
    /// Name of the scheme as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Ntlm => "ntlm",
        }
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = CertsrvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "ntlm" => Ok(Self::Ntlm),
            other => Err(CertsrvError::config(format!(
                "unknown auth method '{}', expected 'basic' or 'ntlm'",
                other
            ))),
        }
    }
}

/// Trust anchor configuration for server certificate verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustAnchors {
    /// Use the platform's native trust store.
    System,

    /// Use the CA certificates in a PEM bundle file.
    CaFile(PathBuf),

    /// Accept any server certificate (insecure, for testing only).
    ///
    /// **WARNING**: This disables all server certificate verification.
    InsecureAcceptAny,
}
