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

//! Classification of enrollment page responses.
//!
//! The certsrv pages report their result as HTML rather than through status
//! codes, so a `200 OK` may still carry a denial or a pending request. The
//! functions here are pure: each looks at one response and decides what it
//! means.
//!
//! Submission pages (`certfnsh.asp`) are checked in order:
//!
//! 1. a `certnew.cer?ReqID=<n>` link means the certificate was issued and can
//!    be downloaded by request ID;
//! 2. a `Certificate Pending` page with `Your Request Id is <n>` means the
//!    request waits for approval;
//! 3. anything else is a denial, with the disposition message as reason.
//!
//! Download pages (`certnew.cer`, `certnew.p7b`) are judged by their exact
//! `Content-Type`.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CertsrvError, Result};
use crate::transport::ResponsePayload;
use crate::types::{CertificateData, RequestOutcome};

/// Reason used when the page carries no disposition message.
pub const UNKNOWN_ERROR: &str = "An unknown error occurred.";

/// Marker of the pending-approval page.
const PENDING_MARKER: &str = "Certificate Pending";

fn issued_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"certnew\.cer\?ReqID=([0-9]+)").expect("valid regex"))
}

fn pending_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Your Request Id is ([0-9]+)").expect("valid regex"))
}

fn disposition_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"The disposition message is "([^"]+)"#).expect("valid regex"))
}

/// Classified response to a certificate submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Issued immediately; download it by request ID.
    Issued {
        /// Request ID of the issued certificate.
        request_id: u64,
    },

    /// Waiting for administrator approval.
    Pending {
        /// Request ID to retrieve the certificate with later.
        request_id: u64,
    },

    /// Denied by the CA.
    Denied {
        /// Disposition message, or [`UNKNOWN_ERROR`].
        reason: String,
    },
}

/// Classify the body of a `certfnsh.asp` response.
///
/// # Errors
///
/// Returns [`CertsrvError::MalformedResponse`] when the page says the request
/// is pending but carries no request ID, or when a request ID does not fit
/// in a `u64`.
pub fn classify_submission(body: &str) -> Result<Submission> {
    if let Some(id) = first_capture(issued_regex(), body) {
        return Ok(Submission::Issued {
            request_id: parse_request_id(id)?,
        });
    }

    if body.contains(PENDING_MARKER) {
        return match first_capture(pending_id_regex(), body) {
            Some(id) => Ok(Submission::Pending {
                request_id: parse_request_id(id)?,
            }),
            None => Err(CertsrvError::malformed_response(
                "certificate pending page without a request ID",
            )),
        };
    }

    Ok(Submission::Denied {
        reason: find_disposition_message(body),
    })
}

/// Classify a certificate download response.
///
/// The certificate is only accepted when the `Content-Type` header equals
/// `expected_content_type` exactly; parameters or case differences count as
/// a mismatch.
pub fn classify_retrieval(payload: ResponsePayload, expected_content_type: &str) -> RequestOutcome {
    if payload.content_type() != Some(expected_content_type) {
        return RequestOutcome::RetrievalFailed {
            reason: find_disposition_message(&payload.text()),
        };
    }

    RequestOutcome::issued(CertificateData::from_bytes(payload.body))
}

/// Extract the disposition message from an enrollment page.
///
/// Always yields a message, falling back to [`UNKNOWN_ERROR`].
pub fn find_disposition_message(body: &str) -> String {
    first_capture(disposition_regex(), body)
        .unwrap_or(UNKNOWN_ERROR)
        .to_string()
}

fn first_capture<'a>(re: &Regex, haystack: &'a str) -> Option<&'a str> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn parse_request_id(digits: &str) -> Result<u64> {
    digits
        .parse()
        .map_err(|_| CertsrvError::malformed_response(format!("invalid request ID '{}'", digits)))
}
