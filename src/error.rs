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

//! Error types for the certsrv client.
//!
//! Transport-level failures (`Transport`, `UnexpectedStatus`, `Http`) are kept
//! apart from protocol-level failures reported by the enrollment pages
//! (`RequestDenied`, `RequestPending`, `CertificateRetrieval`).

use thiserror::Error;

/// Result type alias using [`CertsrvError`].
pub type Result<T> = std::result::Result<T, CertsrvError>;

/// Errors that can occur during certsrv client operations.
#[derive(Debug, Error)]
pub enum CertsrvError {
    /// The server answered with a status outside the 2xx range.
    #[error("HTTP status {status} returned with reason {reason}")]
    Transport {
        /// HTTP status code.
        status: u16,
        /// Reason phrase for the status.
        reason: String,
    },

    /// The server answered with a 2xx status the operation does not expect.
    #[error("Unexpected HTTP status code {status} returned with reason {reason}.")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Reason phrase for the status.
        reason: String,
    },

    /// The certificate request was denied by the CA.
    #[error("Certificate request denied: {0}")]
    RequestDenied(String),

    /// The certificate request is waiting for administrator approval.
    #[error(
        "Your certificate request has been received, however, you must wait for an \
         administrator to issue the certificate you requested. Your request Id is {request_id}."
    )]
    RequestPending {
        /// Request ID to retrieve the certificate with once it is issued.
        request_id: u64,
    },

    /// The response did not carry the expected certificate.
    #[error("Certificate retrieval failed: {0}")]
    CertificateRetrieval(String),

    /// The CSR cannot be submitted.
    #[error("CSR error: {0}")]
    Csr(String),

    /// The enrollment page could not be classified.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// HTTP request or response error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TLS configuration error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// NTLM handshake error.
    #[error("NTLM error: {0}")]
    Ntlm(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CertsrvError {
    /// Create a transport error for a non-success status.
    pub fn transport(status: u16, reason: impl Into<String>) -> Self {
        Self::Transport {
            status,
            reason: reason.into(),
        }
    }

    /// Create an unexpected status error.
    pub fn unexpected_status(status: u16, reason: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            status,
            reason: reason.into(),
        }
    }

    /// Create a request denied error.
    pub fn request_denied(reason: impl Into<String>) -> Self {
        Self::RequestDenied(reason.into())
    }

    /// Create a request pending error.
    pub fn request_pending(request_id: u64) -> Self {
        Self::RequestPending { request_id }
    }

    /// Create a certificate retrieval error.
    pub fn certificate_retrieval(reason: impl Into<String>) -> Self {
        Self::CertificateRetrieval(reason.into())
    }

    /// Create a CSR error with the given message.
    pub fn csr(msg: impl Into<String>) -> Self {
        Self::Csr(msg.into())
    }

    /// Create a malformed response error.
    pub fn malformed_response(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a TLS error with the given message.
    pub fn tls(msg: impl Into<String>) -> Self {
        Self::Tls(msg.into())
    }

    /// Create an NTLM error with the given message.
    pub fn ntlm(msg: impl Into<String>) -> Self {
        Self::Ntlm(msg.into())
    }

    /// Create a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true if the request is waiting for approval.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::RequestPending { .. })
    }

    /// Returns the request ID if this is a `RequestPending` error.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            Self::RequestPending { request_id } => Some(*request_id),
            _ => None,
        }
    }

    /// Returns the HTTP status code for status-related errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } | Self::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
