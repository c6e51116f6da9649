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

//! Integration tests for the NTLM handshake

use base64::prelude::*;
use certsrv_client::{AuthMethod, CertsrvClient, CertsrvConfig, CertsrvError, Encoding};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::integration::{
    fixtures, html_response, MockCertsrvServer, PATH_CERTIFICATE, TEST_PASSWORD,
};

/// A CHALLENGE message with a server timestamp in its target info
fn challenge_header() -> String {
    let mut target_info = Vec::new();
    for (id, value) in [(2u16, "CORP"), (1u16, "CA01")] {
        let value: Vec<u8> = value.encode_utf16().flat_map(u16::to_le_bytes).collect();
        target_info.extend_from_slice(&id.to_le_bytes());
        target_info.extend_from_slice(&(value.len() as u16).to_le_bytes());
        target_info.extend_from_slice(&value);
    }
    target_info.extend_from_slice(&7u16.to_le_bytes());
    target_info.extend_from_slice(&8u16.to_le_bytes());
    target_info.extend_from_slice(&133_000_000_000_000_000u64.to_le_bytes());
    target_info.extend_from_slice(&[0, 0, 0, 0]);

    let mut msg = Vec::new();
    msg.extend_from_slice(b"NTLMSSP\0");
    msg.extend_from_slice(&2u32.to_le_bytes());
    msg.extend_from_slice(&[0, 0, 0, 0, 48, 0, 0, 0]);
    msg.extend_from_slice(&0xe289_8215u32.to_le_bytes());
    msg.extend_from_slice(&[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
    msg.extend_from_slice(&[0u8; 8]);
    let len = (target_info.len() as u16).to_le_bytes();
    msg.extend_from_slice(&len);
    msg.extend_from_slice(&len);
    msg.extend_from_slice(&48u32.to_le_bytes());
    msg.extend_from_slice(&target_info);

    format!("NTLM {}", BASE64_STANDARD.encode(msg))
}

async fn mount_handshake(mock: &MockCertsrvServer) {
    Mock::given(method("GET"))
        .and(path(PATH_CERTIFICATE))
        .and(header_regex("Authorization", "^NTLM TlRMTVNTUAABAAAA"))
        .respond_with(
            html_response(401, "<HTML>401 - Unauthorized</HTML>")
                .insert_header("WWW-Authenticate", challenge_header().as_str()),
        )
        .expect(1)
        .mount(mock.inner())
        .await;

    Mock::given(method("GET"))
        .and(path(PATH_CERTIFICATE))
        .and(header_regex("Authorization", "^NTLM TlRMTVNTUAADAAAA"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(fixtures::CERT_PEM.as_bytes().to_vec())
                .insert_header("Content-Type", "application/pkix-cert"),
        )
        .expect(1)
        .mount(mock.inner())
        .await;
}

#[tokio::test]
async fn test_ntlm_handshake() {
    let mock = MockCertsrvServer::start().await;
    mount_handshake(&mock).await;

    let client = mock.client_with(AuthMethod::Ntlm, "CORP\\svc-enroll");
    let cert = client
        .get_ca_cert(Encoding::Base64)
        .await
        .expect("NTLM request failed");

    assert_eq!(cert.as_text(), Some(fixtures::CERT_PEM));
}

#[tokio::test]
async fn test_ntlm_authenticate_carries_user_and_domain() {
    let mock = MockCertsrvServer::start().await;
    mount_handshake(&mock).await;

    let client = mock.client_with(AuthMethod::Ntlm, "CORP\\svc-enroll");
    client
        .get_ca_cert(Encoding::Base64)
        .await
        .expect("NTLM request failed");

    let requests = mock.inner().received_requests().await.expect("recording enabled");
    let authenticate = requests
        .iter()
        .filter_map(|r| r.headers.get("Authorization"))
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("NTLM TlRMTVNTUAADAAAA"))
        .expect("no AUTHENTICATE message sent");

    let msg = BASE64_STANDARD
        .decode(authenticate.trim_start_matches("NTLM "))
        .unwrap();
    let utf16 = |s: &str| -> Vec<u8> { s.encode_utf16().flat_map(u16::to_le_bytes).collect() };

    assert!(msg.windows(8).any(|w| w == utf16("CORP").as_slice()));
    assert!(msg
        .windows(20)
        .any(|w| w == utf16("svc-enroll").as_slice()));

    // The challenge carries a timestamp, so the message is signed.
    assert_ne!(&msg[72..88], &[0u8; 16]);
}

/// Serve one NTLM challenge whose body is cut short, and a certificate to
/// any other request.
async fn serve_truncated_challenge(listener: TcpListener) {
    let challenge = challenge_header();
    while let Ok((mut socket, _)) = listener.accept().await {
        let mut buf = vec![0u8; 8192];
        let mut len = 0;
        while !buf[..len].windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf[len..]).await {
                Ok(0) | Err(_) => break,
                Ok(n) => len += n,
            }
        }

        let request = String::from_utf8_lossy(&buf[..len]);
        let response = if request.contains("NTLM TlRMTVNTUAAB") {
            format!(
                "HTTP/1.1 401 Unauthorized\r\nWWW-Authenticate: {}\r\nContent-Length: 100\r\n\r\n<HTML>",
                challenge
            )
        } else {
            format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/pkix-cert\r\nContent-Length: {}\r\n\r\n{}",
                fixtures::CERT_PEM.len(),
                fixtures::CERT_PEM
            )
        };
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    }
}

#[tokio::test]
async fn test_ntlm_truncated_challenge_body_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_truncated_challenge(listener));

    let config = CertsrvConfig::builder()
        .server(format!("http://{}", addr))
        .unwrap()
        .credentials("CORP\\svc-enroll", TEST_PASSWORD)
        .auth_method(AuthMethod::Ntlm)
        .build()
        .unwrap();
    let client = CertsrvClient::new(config).unwrap();

    let err = client.get_ca_cert(Encoding::Base64).await.unwrap_err();
    server.abort();

    assert!(matches!(err, CertsrvError::Http(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_ntlm_rejected_without_challenge() {
    let mock = MockCertsrvServer::start().await;

    Mock::given(method("GET"))
        .and(path(PATH_CERTIFICATE))
        .respond_with(
            html_response(401, "<HTML>401 - Unauthorized</HTML>")
                .insert_header("WWW-Authenticate", "Negotiate"),
        )
        .mount(mock.inner())
        .await;

    let client = mock.client_with(AuthMethod::Ntlm, "CORP\\svc-enroll");
    let err = client.get_ca_cert(Encoding::Base64).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(matches!(err, CertsrvError::Transport { .. }));
}
