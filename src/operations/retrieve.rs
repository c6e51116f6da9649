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

//! Certificate downloads (GET certnew.cer / certnew.p7b).

use crate::types::{content_types, paths, Encoding};

/// `ReqID` value addressing the CA's own certificate.
const CA_CERT_ID: &str = "CACert";

/// `Renewal` value selecting the latest CA certificate.
const LATEST_RENEWAL: &str = "-1";

/// A certificate download: where to fetch it and what it must look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieval {
    /// Page path relative to the server URL.
    pub path: &'static str,

    /// Query parameters.
    pub query: Vec<(&'static str, String)>,

    /// `Content-Type` a successful download carries.
    pub content_type: &'static str,
}

impl Retrieval {
    /// An issued certificate, by request ID.
    pub fn existing_cert(request_id: u64, encoding: Encoding) -> Self {
        Self {
            path: paths::CERTIFICATE,
            query: vec![
                ("ReqID", request_id.to_string()),
                ("Enc", encoding.as_str().to_string()),
            ],
            content_type: content_types::PKIX_CERT,
        }
    }

    /// The latest CA certificate.
    pub fn ca_cert(encoding: Encoding) -> Self {
        Self {
            path: paths::CERTIFICATE,
            query: ca_query(encoding),
            content_type: content_types::PKIX_CERT,
        }
    }

    /// The CA certificate chain in PKCS#7 format.
    pub fn ca_chain(encoding: Encoding) -> Self {
        Self {
            path: paths::CHAIN,
            query: ca_query(encoding),
            content_type: content_types::PKCS7_CERTIFICATES,
        }
    }
}

fn ca_query(encoding: Encoding) -> Vec<(&'static str, String)> {
    vec![
        ("ReqID", CA_CERT_ID.to_string()),
        ("Enc", encoding.as_str().to_string()),
        ("Renewal", LATEST_RENEWAL.to_string()),
    ]
}
