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

//! Certificate payloads returned by the enrollment service.

use base64::prelude::*;

use crate::error::Result;

/// A certificate (or PKCS#7 chain) as returned by the server.
///
/// With `Enc=b64` the server sends PEM-armored base64 text; with `Enc=bin`
/// it sends DER. The body is decoded once: valid UTF-8 becomes `Text`,
/// anything else is kept as `Binary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateData {
    /// Text payload, usually PEM.
    Text(String),

    /// Raw binary payload, usually DER.
    Binary(Vec<u8>),
}

impl CertificateData {
    /// Decode a response body, falling back to the raw bytes.
    pub fn from_bytes(body: impl Into<Vec<u8>>) -> Self {
        match String::from_utf8(body.into()) {
            Ok(text) => Self::Text(text),
            Err(e) => Self::Binary(e.into_bytes()),
        }
    }

    /// Returns the text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// Returns the payload bytes as received.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Returns true if the payload is binary.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    /// Decode the payload to DER.
    ///
    /// Text payloads may be PEM-armored or bare base64; armor lines and
    /// whitespace are skipped. Binary payloads are returned unchanged.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        match self {
            Self::Text(text) => {
                let b64: String = text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.starts_with("-----"))
                    .collect();
                Ok(BASE64_STANDARD.decode(b64)?)
            }
            Self::Binary(bytes) => Ok(bytes.clone()),
        }
    }
}

impl std::fmt::Display for CertificateData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Binary(bytes) => write!(f, "<{} bytes of binary data>", bytes.len()),
        }
    }
}
