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

//! certsrv client implementation.
//!
//! This module provides the main `CertsrvClient` struct for interacting with
//! the ADCS web enrollment pages.

use crate::config::CertsrvConfig;
use crate::error::{CertsrvError, Result};
use crate::operations::{submission_form, validate_csr, Retrieval};
use crate::response::{classify_retrieval, classify_submission, Submission};
use crate::transport::Transport;
use crate::types::{paths, CertificateData, CertificateRequest, Encoding, RequestOutcome};

pub mod blocking;

/// Client for the ADCS web enrollment service.
///
/// Each operation comes in two flavors:
/// - `submit` / `fetch_*` return the [`RequestOutcome`], leaving pending and
///   denied requests as ordinary values;
/// - `get_*` return the certificate directly and report every other outcome
///   as a [`CertsrvError`].
///
/// # Example
///
/// ```no_run
/// use certsrv_client::{AuthMethod, CertsrvClient, CertsrvConfig, Encoding};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CertsrvConfig::builder()
///     .server("ca.example.com")?
///     .credentials("CORP\\svc-enroll", "secret")
///     .auth_method(AuthMethod::Ntlm)
///     .build()?;
///
/// let client = CertsrvClient::new(config)?;
///
/// let ca_cert = client.get_ca_cert(Encoding::Base64).await?;
/// println!("{}", ca_cert);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CertsrvClient {
    transport: Transport,
}

impl CertsrvClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if TLS configuration fails.
    pub fn new(config: CertsrvConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &CertsrvConfig {
        self.transport.config()
    }

    // =========================================================================
    // Outcome Operations
    // =========================================================================

    /// Submit a certificate request.
    ///
    /// When the CA issues the certificate immediately it is downloaded in the
    /// request's encoding, so the outcome is that of
    /// [`fetch_existing_cert`](Self::fetch_existing_cert).
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures, on an empty CSR, or when the
    /// response page cannot be classified.
    pub async fn submit(&self, request: &CertificateRequest) -> Result<RequestOutcome> {
        validate_csr(&request.csr)?;

        let form = submission_form(request);
        let payload = match self.transport.post(paths::SUBMIT, &form).await {
            Ok(payload) => payload,
            Err(e) => return unexpected_status_outcome(e),
        };

        match classify_submission(&payload.text())? {
            Submission::Issued { request_id } => {
                tracing::debug!("request {} issued, downloading certificate", request_id);
                self.fetch_existing_cert(request_id, request.encoding).await
            }
            Submission::Pending { request_id } => Ok(RequestOutcome::Pending { request_id }),
            Submission::Denied { reason } => Ok(RequestOutcome::Denied { reason }),
        }
    }

    /// Download an issued certificate by request ID.
    pub async fn fetch_existing_cert(
        &self,
        request_id: u64,
        encoding: Encoding,
    ) -> Result<RequestOutcome> {
        let retrieval = Retrieval::existing_cert(request_id, encoding);
        self.retrieve(retrieval).await
    }

    /// Download the latest CA certificate.
    pub async fn fetch_ca_cert(&self, encoding: Encoding) -> Result<RequestOutcome> {
        self.retrieve(Retrieval::ca_cert(encoding)).await
    }

    /// Download the CA certificate chain (PKCS#7).
    pub async fn fetch_ca_chain(&self, encoding: Encoding) -> Result<RequestOutcome> {
        self.retrieve(Retrieval::ca_chain(encoding)).await
    }

    // =========================================================================
    // Certificate Operations
    // =========================================================================

    /// Request a certificate from `template`.
    ///
    /// # Errors
    ///
    /// Returns [`CertsrvError::RequestPending`] when the request needs
    /// approval and [`CertsrvError::RequestDenied`] when the CA denies it.
    pub async fn get_cert(
        &self,
        csr: impl Into<Vec<u8>>,
        template: impl Into<String>,
        encoding: Encoding,
    ) -> Result<CertificateData> {
        let request = CertificateRequest::new(csr, template).encoding(encoding);
        self.submit(&request).await?.into_certificate()
    }

    /// Get an already issued certificate.
    ///
    /// # Errors
    ///
    /// Returns [`CertsrvError::CertificateRetrieval`] if the certificate
    /// cannot be retrieved.
    pub async fn get_existing_cert(
        &self,
        request_id: u64,
        encoding: Encoding,
    ) -> Result<CertificateData> {
        self.fetch_existing_cert(request_id, encoding)
            .await?
            .into_certificate()
    }

    /// Get the latest CA certificate.
    pub async fn get_ca_cert(&self, encoding: Encoding) -> Result<CertificateData> {
        self.fetch_ca_cert(encoding).await?.into_certificate()
    }

    /// Get the CA chain in PKCS#7 format.
    pub async fn get_ca_chain(&self, encoding: Encoding) -> Result<CertificateData> {
        self.fetch_ca_chain(encoding).await?.into_certificate()
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    async fn retrieve(&self, retrieval: Retrieval) -> Result<RequestOutcome> {
        match self.transport.get(retrieval.path, &retrieval.query).await {
            Ok(payload) => Ok(classify_retrieval(payload, retrieval.content_type)),
            Err(e) => unexpected_status_outcome(e),
        }
    }
}

/// Report an unexpected 2xx status as an outcome; other errors pass through.
fn unexpected_status_outcome(err: CertsrvError) -> Result<RequestOutcome> {
    match err {
        CertsrvError::UnexpectedStatus { status, reason } => {
            Ok(RequestOutcome::UnexpectedStatus {
                code: status,
                reason,
            })
        }
        other => Err(other),
    }
}
