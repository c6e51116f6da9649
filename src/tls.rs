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

//! HTTP client construction with the configured TLS trust.

use std::path::Path;

use crate::config::{CertsrvConfig, TrustAnchors};
use crate::error::{CertsrvError, Result};

/// Build a reqwest Client with the appropriate TLS configuration.
pub fn build_http_client(config: &CertsrvConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .use_rustls_tls()
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        // The peer certificate feeds NTLM channel binding.
        .tls_info(true);

    match &config.trust_anchors {
        TrustAnchors::System => {
            builder = builder.tls_built_in_root_certs(true);
        }
        TrustAnchors::CaFile(path) => {
            builder = builder.tls_built_in_root_certs(false);
            for cert in load_ca_file(path)? {
                builder = builder.add_root_certificate(cert);
            }
        }
        TrustAnchors::InsecureAcceptAny => {
            builder = builder
                .tls_built_in_root_certs(false)
                .danger_accept_invalid_certs(true);
        }
    }

    builder
        .build()
        .map_err(|e| CertsrvError::tls(format!("Failed to build HTTP client: {}", e)))
}

/// Load the CA certificates from a PEM bundle.
pub fn load_ca_file(path: &Path) -> Result<Vec<reqwest::Certificate>> {
    let pem = std::fs::read(path)?;
    parse_pem_bundle(&pem)
        .map_err(|e| CertsrvError::tls(format!("{}: {}", path.display(), e)))
}

fn parse_pem_bundle(pem: &[u8]) -> std::result::Result<Vec<reqwest::Certificate>, String> {
    let certs = reqwest::Certificate::from_pem_bundle(pem)
        .map_err(|e| format!("Failed to parse CA certificates: {}", e))?;

    if certs.is_empty() {
        return Err("No certificates found in PEM data".to_string());
    }

    Ok(certs)
}
