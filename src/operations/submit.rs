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

//! Certificate request submission (POST certfnsh.asp).

use base64::prelude::*;

use crate::error::{CertsrvError, Result};
use crate::types::CertificateRequest;

/// Friendly name the web enrollment pages give saved requests.
const FRIENDLY_TYPE: &str = "Saved-Request Certificate";

/// Check that a CSR can be submitted.
///
/// The CSR contents are left to the CA; only obviously unusable input is
/// rejected here.
pub fn validate_csr(csr: &[u8]) -> Result<()> {
    if csr.iter().all(u8::is_ascii_whitespace) {
        return Err(CertsrvError::csr("Empty CSR"));
    }

    Ok(())
}

/// Encode a CSR for the `CertRequest` form field.
///
/// PEM (or already base64-encoded) CSRs are passed through; DER CSRs are
/// base64-encoded, which the CA accepts without armor.
pub fn encode_csr(csr: &[u8]) -> String {
    match std::str::from_utf8(csr) {
        Ok(text) => text.to_string(),
        Err(_) => BASE64_STANDARD.encode(csr),
    }
}

/// Build the form fields for a new certificate request.
pub fn submission_form(request: &CertificateRequest) -> Vec<(&'static str, String)> {
    vec![
        ("Mode", "newreq".to_string()),
        ("CertRequest", encode_csr(&request.csr)),
        (
            "CertAttrib",
            format!("CertificateTemplate:{}", request.template),
        ),
        ("FriendlyType", FRIENDLY_TYPE.to_string()),
        ("TargetStoreFlags", "0".to_string()),
        ("SaveCert", "yes".to_string()),
    ]
}
