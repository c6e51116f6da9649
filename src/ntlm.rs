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

//! NTLMv2 HTTP authentication (MS-NLMP).
//!
//! Only the messages needed for HTTP authentication are produced: a
//! NEGOTIATE message, parsing of the server's CHALLENGE, and an AUTHENTICATE
//! message carrying an NTLMv2 response and a MIC. Over TLS the response is
//! bound to the server certificate (`tls-server-end-point`, RFC 5929) so
//! that servers enforcing Extended Protection accept it. No session key is
//! exchanged and no message signing or sealing is performed.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::prelude::*;
use hmac::{Hmac, Mac};
use md4::{Digest, Md4};
use md5::Md5;
use sha2::{Sha256, Sha384, Sha512};
use x509_cert::der::Decode;
use x509_cert::Certificate;

use crate::config::Credentials;
use crate::error::{CertsrvError, Result};

const SIGNATURE: &[u8; 8] = b"NTLMSSP\0";

const NEGOTIATE: u32 = 1;
const CHALLENGE: u32 = 2;
const AUTHENTICATE: u32 = 3;

const NEGOTIATE_UNICODE: u32 = 0x0000_0001;
const REQUEST_TARGET: u32 = 0x0000_0004;
const NEGOTIATE_NTLM: u32 = 0x0000_0200;
const NEGOTIATE_ALWAYS_SIGN: u32 = 0x0000_8000;
const NEGOTIATE_EXTENDED_SESSIONSECURITY: u32 = 0x0008_0000;
const NEGOTIATE_TARGET_INFO: u32 = 0x0080_0000;
const NEGOTIATE_VERSION: u32 = 0x0200_0000;
const NEGOTIATE_128: u32 = 0x2000_0000;
const NEGOTIATE_56: u32 = 0x8000_0000;

const CLIENT_FLAGS: u32 = NEGOTIATE_UNICODE
    | REQUEST_TARGET
    | NEGOTIATE_NTLM
    | NEGOTIATE_ALWAYS_SIGN
    | NEGOTIATE_EXTENDED_SESSIONSECURITY
    | NEGOTIATE_TARGET_INFO
    | NEGOTIATE_VERSION
    | NEGOTIATE_128
    | NEGOTIATE_56;

const AV_EOL: u16 = 0;
const AV_FLAGS: u16 = 6;
const AV_TIMESTAMP: u16 = 7;
const AV_CHANNEL_BINDINGS: u16 = 10;

/// `MsvAvFlags` bit announcing a MIC in the AUTHENTICATE message.
const AV_FLAG_MIC: u32 = 0x0000_0002;

/// Windows 10.0.19041, NTLMSSP revision 15.
const VERSION: [u8; 8] = [10, 0, 0x61, 0x4a, 0, 0, 0, 15];

/// AUTHENTICATE header: six security buffers, flags, version and MIC.
const AUTHENTICATE_HEADER_LEN: u32 = 88;
const MIC_OFFSET: usize = 72;

const TLS_SERVER_END_POINT: &[u8] = b"tls-server-end-point:";

const SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
const SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";
const ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
const ECDSA_WITH_SHA512: &str = "1.2.840.10045.4.3.4";

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_EPOCH_OFFSET: u64 = 11_644_473_600;

/// Authorization scheme name.
pub const SCHEME: &str = "NTLM";

type HmacMd5 = Hmac<Md5>;

/// Credentials split into the parts NTLM hashes separately.
#[derive(Clone)]
pub struct NtlmCredentials {
    /// Domain name, empty when not given.
    pub domain: String,
    /// User name without domain.
    pub username: String,
    /// Password.
    pub password: String,
}

impl NtlmCredentials {
    /// Split `DOMAIN\user` usernames; other forms are used as-is.
    pub fn from_credentials(credentials: &Credentials) -> Self {
        let (domain, username) = match credentials.username.split_once('\\') {
            Some((domain, user)) => (domain.to_string(), user.to_string()),
            None => (String::new(), credentials.username.clone()),
        };

        Self {
            domain,
            username,
            password: credentials.password.clone(),
        }
    }
}

impl std::fmt::Debug for NtlmCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NtlmCredentials")
            .field("domain", &self.domain)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Server CHALLENGE message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Negotiated flags.
    pub flags: u32,
    /// Server nonce.
    pub server_challenge: [u8; 8],
    /// Raw AV_PAIR list.
    pub target_info: Vec<u8>,
    /// The message as received; the MIC covers it.
    pub raw: Vec<u8>,
}

impl Challenge {
    /// Parse a binary CHALLENGE message.
    pub fn parse(msg: &[u8]) -> Result<Self> {
        if msg.len() < 32 || &msg[..8] != SIGNATURE {
            return Err(CertsrvError::ntlm("not an NTLMSSP message"));
        }
        if read_u32(msg, 8)? != CHALLENGE {
            return Err(CertsrvError::ntlm("expected a CHALLENGE message"));
        }

        let flags = read_u32(msg, 20)?;
        let mut server_challenge = [0u8; 8];
        server_challenge.copy_from_slice(&msg[24..32]);

        // Target info is optional in very old servers; its field starts at 40.
        let target_info = if msg.len() >= 48 {
            read_security_buffer(msg, 40)?.to_vec()
        } else {
            Vec::new()
        };

        Ok(Self {
            flags,
            server_challenge,
            target_info,
            raw: msg.to_vec(),
        })
    }

    /// Decode a challenge from a `WWW-Authenticate` header value.
    ///
    /// Returns `None` for values that are not `NTLM <token>`, such as the bare
    /// `NTLM` offer or other schemes.
    pub fn from_header(value: &str) -> Option<Result<Self>> {
        let (scheme, token) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case(SCHEME) {
            return None;
        }

        Some(
            BASE64_STANDARD
                .decode(token.trim())
                .map_err(CertsrvError::from)
                .and_then(|msg| Self::parse(&msg)),
        )
    }

    /// Server timestamp from the target info, as a FILETIME.
    pub fn timestamp(&self) -> Option<u64> {
        av_pairs(&self.target_info)
            .into_iter()
            .find(|(id, value)| *id == AV_TIMESTAMP && value.len() == 8)
            .map(|(_, value)| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(value);
                u64::from_le_bytes(buf)
            })
    }
}

/// Build the NEGOTIATE message.
pub fn negotiate_message() -> Vec<u8> {
    let mut msg = Vec::with_capacity(32);
    msg.extend_from_slice(SIGNATURE);
    msg.extend_from_slice(&NEGOTIATE.to_le_bytes());
    msg.extend_from_slice(&CLIENT_FLAGS.to_le_bytes());
    // Empty domain and workstation security buffers.
    msg.extend_from_slice(&[0u8; 16]);
    msg.extend_from_slice(&VERSION);
    msg
}

/// Build the AUTHENTICATE message answering `challenge`.
///
/// `negotiate` is the NEGOTIATE message sent on the first leg.
/// `channel_binding` is the application data from [`tls_server_end_point`]
/// when the connection is TLS.
pub fn authenticate_message(
    credentials: &NtlmCredentials,
    negotiate: &[u8],
    challenge: &Challenge,
    channel_binding: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let client_challenge: [u8; 8] = rand::random();
    let timestamp = challenge.timestamp().unwrap_or_else(filetime_now);
    build_authenticate(
        credentials,
        negotiate,
        challenge,
        channel_binding,
        client_challenge,
        timestamp,
    )
}

/// `tls-server-end-point` channel binding data for a DER server certificate.
///
/// The certificate is hashed with its signature hash, SHA-256 when that is
/// MD5, SHA-1 or unknown.
pub fn tls_server_end_point(cert_der: &[u8]) -> Vec<u8> {
    let algorithm = Certificate::from_der(cert_der)
        .map(|cert| cert.signature_algorithm.oid.to_string())
        .unwrap_or_default();

    let mut data = TLS_SERVER_END_POINT.to_vec();
    data.extend_from_slice(&end_point_hash(&algorithm, cert_der));
    data
}

fn end_point_hash(signature_algorithm: &str, cert_der: &[u8]) -> Vec<u8> {
    match signature_algorithm {
        SHA384_WITH_RSA | ECDSA_WITH_SHA384 => Sha384::digest(cert_der).to_vec(),
        SHA512_WITH_RSA | ECDSA_WITH_SHA512 => Sha512::digest(cert_der).to_vec(),
        _ => Sha256::digest(cert_der).to_vec(),
    }
}

/// MD5 of a `gss_channel_bindings_struct` with empty addresses.
fn channel_bindings_hash(application_data: &[u8]) -> [u8; 16] {
    let mut bindings = vec![0u8; 16];
    bindings.extend_from_slice(&(application_data.len() as u32).to_le_bytes());
    bindings.extend_from_slice(application_data);

    let mut out = [0u8; 16];
    out.copy_from_slice(&Md5::digest(&bindings));
    out
}

/// Format a message as an `Authorization` header value.
pub fn header_value(msg: &[u8]) -> String {
    format!("{} {}", SCHEME, BASE64_STANDARD.encode(msg))
}

fn build_authenticate(
    credentials: &NtlmCredentials,
    negotiate: &[u8],
    challenge: &Challenge,
    channel_binding: Option<&[u8]>,
    client_challenge: [u8; 8],
    timestamp: u64,
) -> Result<Vec<u8>> {
    // A MIC is only sent when the server provides a timestamp.
    let with_mic = challenge.timestamp().is_some();
    let target_info = client_target_info(&challenge.target_info, with_mic, channel_binding);

    let key = ntowfv2(credentials)?;
    let (lm_response, nt_response) = ntlmv2_responses(
        &key,
        &challenge.server_challenge,
        &client_challenge,
        timestamp,
        &target_info,
    )?;

    // With a server timestamp present the LM response must be zeroed.
    let lm_response = if with_mic { vec![0u8; 24] } else { lm_response };

    let domain = utf16le(&credentials.domain);
    let user = utf16le(&credentials.username);
    let workstation: Vec<u8> = Vec::new();
    let flags = (challenge.flags & CLIENT_FLAGS) | NEGOTIATE_UNICODE | NEGOTIATE_NTLM;

    let fields: [&[u8]; 5] = [&lm_response, &nt_response, &domain, &user, &workstation];

    let mut msg = Vec::with_capacity(
        AUTHENTICATE_HEADER_LEN as usize + fields.iter().map(|f| f.len()).sum::<usize>(),
    );
    msg.extend_from_slice(SIGNATURE);
    msg.extend_from_slice(&AUTHENTICATE.to_le_bytes());

    let mut offset = AUTHENTICATE_HEADER_LEN;
    for field in fields {
        let len = u16::try_from(field.len())
            .map_err(|_| CertsrvError::ntlm("AUTHENTICATE field too long"))?;
        msg.extend_from_slice(&len.to_le_bytes());
        msg.extend_from_slice(&len.to_le_bytes());
        msg.extend_from_slice(&offset.to_le_bytes());
        offset += u32::from(len);
    }
    // Empty encrypted session key.
    msg.extend_from_slice(&[0u8; 4]);
    msg.extend_from_slice(&offset.to_le_bytes());
    msg.extend_from_slice(&flags.to_le_bytes());
    msg.extend_from_slice(&VERSION);
    // MIC, filled in below once the whole message is known.
    msg.extend_from_slice(&[0u8; 16]);

    for field in fields {
        msg.extend_from_slice(field);
    }

    if with_mic {
        let session_key = hmac_md5(&key, &nt_response[..16])?;
        let signed = [negotiate, challenge.raw.as_slice(), msg.as_slice()].concat();
        let mic = hmac_md5(&session_key, &signed)?;
        msg[MIC_OFFSET..MIC_OFFSET + 16].copy_from_slice(&mic);
    }

    Ok(msg)
}

/// The server's AV pairs with the MIC flag and channel bindings added.
fn client_target_info(
    server_info: &[u8],
    with_mic: bool,
    channel_binding: Option<&[u8]>,
) -> Vec<u8> {
    let mut flags = if with_mic { AV_FLAG_MIC } else { 0 };
    let mut info = Vec::with_capacity(server_info.len() + 32);

    for (id, value) in av_pairs(server_info) {
        match id {
            AV_FLAGS if value.len() == 4 => {
                flags |= u32::from_le_bytes([value[0], value[1], value[2], value[3]]);
            }
            AV_FLAGS | AV_CHANNEL_BINDINGS => {}
            _ => push_av_pair(&mut info, id, value),
        }
    }

    if flags != 0 {
        push_av_pair(&mut info, AV_FLAGS, &flags.to_le_bytes());
    }
    if let Some(application_data) = channel_binding {
        push_av_pair(
            &mut info,
            AV_CHANNEL_BINDINGS,
            &channel_bindings_hash(application_data),
        );
    }
    push_av_pair(&mut info, AV_EOL, &[]);
    info
}

/// AV pairs up to, not including, `MsvAvEOL`.
fn av_pairs(mut rest: &[u8]) -> Vec<(u16, &[u8])> {
    let mut pairs = Vec::new();
    while rest.len() >= 4 {
        let id = u16::from_le_bytes([rest[0], rest[1]]);
        let len = u16::from_le_bytes([rest[2], rest[3]]) as usize;
        if id == AV_EOL {
            break;
        }
        let Some(value) = rest.get(4..4 + len) else {
            break;
        };
        pairs.push((id, value));
        rest = &rest[4 + len..];
    }
    pairs
}

fn push_av_pair(info: &mut Vec<u8>, id: u16, value: &[u8]) {
    info.extend_from_slice(&id.to_le_bytes());
    info.extend_from_slice(&(value.len() as u16).to_le_bytes());
    info.extend_from_slice(value);
}

/// NT one-way function: MD4 of the UTF-16LE password.
fn nt_hash(password: &str) -> [u8; 16] {
    let digest = Md4::digest(utf16le(password));
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest);
    out
}

/// NTOWFv2: HMAC-MD5 keyed by the NT hash over upper-cased user and domain.
fn ntowfv2(credentials: &NtlmCredentials) -> Result<[u8; 16]> {
    let identity = format!("{}{}", credentials.username.to_uppercase(), credentials.domain);
    hmac_md5(&nt_hash(&credentials.password), &utf16le(&identity))
}

/// Compute the LMv2 and NTLMv2 responses.
fn ntlmv2_responses(
    key: &[u8; 16],
    server_challenge: &[u8; 8],
    client_challenge: &[u8; 8],
    timestamp: u64,
    target_info: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut blob = Vec::with_capacity(32 + target_info.len());
    blob.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    blob.extend_from_slice(&timestamp.to_le_bytes());
    blob.extend_from_slice(client_challenge);
    blob.extend_from_slice(&[0u8; 4]);
    blob.extend_from_slice(target_info);
    blob.extend_from_slice(&[0u8; 4]);

    let nt_proof = hmac_md5(key, &[server_challenge.as_slice(), &blob].concat())?;
    let mut nt_response = nt_proof.to_vec();
    nt_response.extend_from_slice(&blob);

    let lm_proof = hmac_md5(key, &[server_challenge.as_slice(), client_challenge].concat())?;
    let mut lm_response = lm_proof.to_vec();
    lm_response.extend_from_slice(client_challenge);

    Ok((lm_response, nt_response))
}

fn hmac_md5(key: &[u8], data: &[u8]) -> Result<[u8; 16]> {
    let mut mac = HmacMd5::new_from_slice(key).map_err(|e| CertsrvError::ntlm(e.to_string()))?;
    mac.update(data);
    let digest = mac.finalize().into_bytes();
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest);
    Ok(out)
}

fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn filetime_now() -> u64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    (secs + FILETIME_EPOCH_OFFSET) * 10_000_000
}

fn read_u16(msg: &[u8], offset: usize) -> Result<u16> {
    msg.get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| CertsrvError::ntlm("truncated message"))
}

fn read_u32(msg: &[u8], offset: usize) -> Result<u32> {
    msg.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| CertsrvError::ntlm("truncated message"))
}

fn read_security_buffer(msg: &[u8], field: usize) -> Result<&[u8]> {
    let len = read_u16(msg, field)? as usize;
    let offset = read_u32(msg, field + 4)? as usize;
    msg.get(offset..offset + len)
        .ok_or_else(|| CertsrvError::ntlm("security buffer out of bounds"))
}
