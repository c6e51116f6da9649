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

//! Request and outcome types for the certsrv web enrollment pages.

mod certificate;

pub use certificate::CertificateData;

use std::fmt;
use std::str::FromStr;

use crate::error::{CertsrvError, Result};

/// Output encoding requested from the server (`Enc` query parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Base64 (PEM) text.
    #[default]
    Base64,

    /// DER binary.
    Binary,
}

impl Encoding {
    /// Wire value of the `Enc` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base64 => "b64",
            Self::Binary => "bin",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = CertsrvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "b64" | "base64" | "pem" => Ok(Self::Base64),
            "bin" | "binary" | "der" => Ok(Self::Binary),
            other => Err(CertsrvError::config(format!("unknown encoding '{}'", other))),
        }
    }
}

/// A certificate signing request to submit to the CA.
#[derive(Debug, Clone)]
pub struct CertificateRequest {
    /// The CSR, either PEM text or DER bytes.
    pub csr: Vec<u8>,

    /// Name of the certificate template to issue from.
    pub template: String,

    /// Encoding of the certificate returned on immediate issuance.
    pub encoding: Encoding,
}

impl CertificateRequest {
    /// Create a new request with the default (base64) encoding.
    pub fn new(csr: impl Into<Vec<u8>>, template: impl Into<String>) -> Self {
        Self {
            csr: csr.into(),
            template: template.into(),
            encoding: Encoding::default(),
        }
    }

    /// Set the encoding of the returned certificate.
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Result of a single enrollment operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The certificate was issued.
    Issued {
        /// The certificate as returned by the server.
        certificate: CertificateData,
    },

    /// The request is waiting for administrator approval.
    Pending {
        /// Request ID to retrieve the certificate with later.
        request_id: u64,
    },

    /// The request was denied by the CA.
    Denied {
        /// Disposition message from the server.
        reason: String,
    },

    /// The certificate could not be retrieved.
    RetrievalFailed {
        /// Disposition message from the server.
        reason: String,
    },

    /// The server answered with a success status the operation does not expect.
    UnexpectedStatus {
        /// HTTP status code.
        code: u16,
        /// Reason phrase for the status.
        reason: String,
    },
}

impl RequestOutcome {
    /// Create a new issued outcome.
    pub fn issued(certificate: CertificateData) -> Self {
        Self::Issued { certificate }
    }

    /// Returns true if the request is pending.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Returns the request ID if pending.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            Self::Pending { request_id } => Some(*request_id),
            _ => None,
        }
    }

    /// Convert the outcome into the issued certificate or the matching error.
    pub fn into_certificate(self) -> Result<CertificateData> {
        match self {
            Self::Issued { certificate } => Ok(certificate),
            Self::Pending { request_id } => Err(CertsrvError::request_pending(request_id)),
            Self::Denied { reason } => Err(CertsrvError::request_denied(reason)),
            Self::RetrievalFailed { reason } => Err(CertsrvError::certificate_retrieval(reason)),
            Self::UnexpectedStatus { code, reason } => {
                Err(CertsrvError::unexpected_status(code, reason))
            }
        }
    }
}

/// Content types returned by the enrollment pages.
pub mod content_types {
    /// Single X.509 certificate.
    pub const PKIX_CERT: &str = "application/pkix-cert";

    /// PKCS#7 certificate chain.
    pub const PKCS7_CERTIFICATES: &str = "application/x-pkcs7-certificates";
}

/// Enrollment page paths, relative to the server URL.
pub mod paths {
    /// Certificate request submission page.
    pub const SUBMIT: &str = "certsrv/certfnsh.asp";

    /// Single certificate download.
    pub const CERTIFICATE: &str = "certsrv/certnew.cer";

    /// PKCS#7 chain download.
    pub const CHAIN: &str = "certsrv/certnew.p7b";
}
