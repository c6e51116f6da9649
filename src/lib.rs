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

//! # certsrv-client
//!
//! A client for the Active Directory Certificate Services (ADCS) Web
//! Enrollment pages (`/certsrv`).
//!
//! The web enrollment service has no machine-readable API: requests are
//! submitted as HTML forms and the result is reported in the returned page.
//! This crate submits certificate requests, recognizes pending and denied
//! requests, and downloads issued certificates, the CA certificate and the
//! CA chain.
//!
//! ## Features
//!
//! - **HTTP Basic and NTLMv2** authentication
//! - **Typed outcomes**: issued, pending (with request ID), denied, retrieval failure
//! - **PEM or DER** output (`Enc=b64` / `Enc=bin`)
//! - **Custom CA bundle** or the platform trust store for TLS
//! - **Blocking client** in [`blocking`] for callers without an async runtime
//!
//! ## Quick Start
//!
//! ```no_run
//! use certsrv_client::{CertsrvClient, CertsrvConfig, CertificateRequest, RequestOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CertsrvConfig::builder()
//!         .server("https://ca.example.com")?
//!         .credentials("user", "password")
//!         .build()?;
//!
//!     let client = CertsrvClient::new(config)?;
//!
//!     let csr = std::fs::read("server.csr")?;
//!     match client.submit(&CertificateRequest::new(csr, "WebServer")).await? {
//!         RequestOutcome::Issued { certificate } => println!("{}", certificate),
//!         RequestOutcome::Pending { request_id } => {
//!             println!("Waiting for approval, request ID {}", request_id)
//!         }
//!         other => eprintln!("Not issued: {:?}", other),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod config;
pub mod config_file;
pub mod error;
pub mod ntlm;
pub mod operations;
pub mod response;
pub mod tls;
pub mod transport;
pub mod types;

// Re-export main types at crate root for convenience
pub use client::{blocking, CertsrvClient};
pub use config::{AuthMethod, CertsrvConfig, CertsrvConfigBuilder, Credentials, TrustAnchors};
pub use error::{CertsrvError, Result};
pub use response::Submission;
pub use transport::ResponsePayload;
pub use types::{CertificateData, CertificateRequest, Encoding, RequestOutcome};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent string for HTTP requests.
///
/// The web enrollment pages only serve browsers they recognize.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1; rv:77.0) Gecko/20190101 Firefox/77.0";
