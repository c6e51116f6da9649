// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! TOML configuration file for the `certsrv` tool.
//!
//! ```toml
//! [server]
//! url = "https://ca.example.com"
//! ca_file = "/etc/pki/corp-root.pem"
//! timeout_secs = 30
//!
//! [authentication]
//! method = "ntlm"
//! username = "CORP\\svc-enroll"
//! password = "..."
//! ```
//!
//! The password may be left out of the file and supplied through the
//! environment instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{AuthMethod, CertsrvConfig};
use crate::error::{CertsrvError, Result};

/// Complete configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerSection,

    /// Authentication configuration.
    #[serde(default)]
    pub authentication: AuthenticationSection,
}

/// `[server]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Host name or base URL of the ADCS server.
    #[serde(default)]
    pub url: String,

    /// PEM bundle of trusted CA certificates.
    pub ca_file: Option<PathBuf>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,

    /// Skip server certificate verification.
    #[serde(default)]
    pub insecure: bool,
}

/// `[authentication]` table.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthenticationSection {
    /// Authentication scheme.
    #[serde(default)]
    pub method: AuthMethod,

    /// Username, optionally as `DOMAIN\user`.
    pub username: Option<String>,

    /// Password.
    pub password: Option<String>,
}

impl std::fmt::Debug for AuthenticationSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationSection")
            .field("method", &self.method)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ConfigFile {
    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or has unknown fields.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| CertsrvError::config(format!("Invalid TOML: {e}")))
    }

    /// Load configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        tracing::debug!("loaded configuration from {}", path.display());
        Self::from_toml(&contents)
    }

    /// Validate the configuration for completeness.
    ///
    /// # Errors
    ///
    /// Returns an error listing every missing field.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.server.url.is_empty() {
            errors.push("server.url is required");
        }
        if self.authentication.username.is_none() {
            errors.push("authentication.username is required");
        }
        if self.authentication.password.is_none() {
            errors.push("authentication.password is required");
        }
        if self.server.insecure && self.server.ca_file.is_some() {
            errors.push("server.insecure and server.ca_file are mutually exclusive");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CertsrvError::config(errors.join("; ")))
        }
    }

    /// Build the client configuration.
    pub fn to_client_config(&self) -> Result<CertsrvConfig> {
        self.validate()?;

        let mut builder = CertsrvConfig::builder()
            .server(&self.server.url)?
            .credentials(
                self.authentication.username.clone().unwrap_or_default(),
                self.authentication.password.clone().unwrap_or_default(),
            )
            .auth_method(self.authentication.method);

        if let Some(ref ca_file) = self.server.ca_file {
            builder = builder.ca_file(ca_file);
        }
        if self.server.insecure {
            builder = builder.trust_any_insecure();
        }
        if let Some(secs) = self.server.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build().map_err(CertsrvError::config)
    }
}
