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

//! Synchronous certsrv client.
//!
//! Every call blocks the calling thread until the round trip completes. The
//! client drives the async client on a private current-thread runtime, so it
//! must not be used from within an async context.
//!
//! # Example
//!
//! ```no_run
//! use certsrv_client::blocking::CertsrvClient;
//! use certsrv_client::{CertsrvConfig, Encoding};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CertsrvConfig::builder()
//!     .server("ca.example.com")?
//!     .credentials("user", "password")
//!     .build()?;
//!
//! let client = CertsrvClient::new(config)?;
//! let chain = client.get_ca_chain(Encoding::Base64)?;
//! println!("{}", chain);
//! # Ok(())
//! # }
//! ```

use tokio::runtime::{Builder, Runtime};

use crate::config::CertsrvConfig;
use crate::error::Result;
use crate::types::{CertificateData, CertificateRequest, Encoding, RequestOutcome};

/// Blocking client for the ADCS web enrollment service.
///
/// Mirrors [`crate::CertsrvClient`] operation for operation.
#[derive(Debug)]
pub struct CertsrvClient {
    inner: super::CertsrvClient,
    runtime: Runtime,
}

impl CertsrvClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if TLS configuration fails or the runtime cannot be
    /// started.
    pub fn new(config: CertsrvConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let inner = super::CertsrvClient::new(config)?;

        Ok(Self { inner, runtime })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &CertsrvConfig {
        self.inner.config()
    }

    /// Submit a certificate request. See [`crate::CertsrvClient::submit`].
    pub fn submit(&self, request: &CertificateRequest) -> Result<RequestOutcome> {
        self.runtime.block_on(self.inner.submit(request))
    }

    /// Download an issued certificate by request ID.
    pub fn fetch_existing_cert(
        &self,
        request_id: u64,
        encoding: Encoding,
    ) -> Result<RequestOutcome> {
        self.runtime.block_on(self.inner.fetch_existing_cert(request_id, encoding))
    }

    /// Download the latest CA certificate.
    pub fn fetch_ca_cert(&self, encoding: Encoding) -> Result<RequestOutcome> {
        self.runtime.block_on(self.inner.fetch_ca_cert(encoding))
    }

    /// Download the CA certificate chain (PKCS#7).
    pub fn fetch_ca_chain(&self, encoding: Encoding) -> Result<RequestOutcome> {
        self.runtime.block_on(self.inner.fetch_ca_chain(encoding))
    }

    /// Request a certificate from `template`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CertsrvError::RequestPending`] when the request needs
    /// approval and [`crate::CertsrvError::RequestDenied`] when the CA denies it.
    pub fn get_cert(
        &self,
        csr: impl Into<Vec<u8>>,
        template: impl Into<String>,
        encoding: Encoding,
    ) -> Result<CertificateData> {
        self.runtime.block_on(self.inner.get_cert(csr, template, encoding))
    }

    /// Get an already issued certificate.
    pub fn get_existing_cert(
        &self,
        request_id: u64,
        encoding: Encoding,
    ) -> Result<CertificateData> {
        self.runtime.block_on(self.inner.get_existing_cert(request_id, encoding))
    }

    /// Get the latest CA certificate.
    pub fn get_ca_cert(&self, encoding: Encoding) -> Result<CertificateData> {
        self.runtime.block_on(self.inner.get_ca_cert(encoding))
    }

    /// Get the CA chain in PKCS#7 format.
    pub fn get_ca_chain(&self, encoding: Encoding) -> Result<CertificateData> {
        self.runtime.block_on(self.inner.get_ca_chain(encoding))
    }
}
