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


//! Integration tests for the blocking client

use crate::integration::{fixtures, pages, MockCertsrvServer, PATH_CHAIN, TEST_USERNAME};
use certsrv_client::blocking::CertsrvClient;
use certsrv_client::{AuthMethod, CertificateData, CertificateRequest, CertsrvError, Encoding};

const CSR_PEM: &str =
    "-----BEGIN CERTIFICATE REQUEST-----\nMIIB\n-----END CERTIFICATE REQUEST-----\n";

// The blocking client owns a runtime, so it is built, used and dropped off
// the test runtime's worker.

#[tokio::test]
async fn test_blocking_submit_and_chain() {
    let mock = MockCertsrvServer::start().await;
    mock.mock_submit_page(&pages::issued(1234)).await;
    mock.mock_certificate("1234", fixtures::CERT_PEM.as_bytes()).await;
    mock.mock_chain(fixtures::CHAIN_PEM.as_bytes()).await;

    let config = mock.config_with(AuthMethod::Basic, TEST_USERNAME);
    let (outcome, chain) = tokio::task::spawn_blocking(move || {
        let client = CertsrvClient::new(config).expect("Client creation failed");
        let request = CertificateRequest::new(CSR_PEM, "WebServer");
        let outcome = client.submit(&request).expect("submit failed");
        let chain = client
            .get_ca_chain(Encoding::Base64)
            .expect("get_ca_chain failed");
        (outcome, chain)
    })
    .await
    .expect("blocking task panicked");

    assert_eq!(
        outcome.into_certificate().unwrap(),
        CertificateData::Text(fixtures::CERT_PEM.to_string())
    );
    assert_eq!(chain.as_text(), Some(fixtures::CHAIN_PEM));
}

#[tokio::test]
async fn test_blocking_pending_and_status_errors() {
    let mock = MockCertsrvServer::start().await;
    mock.mock_submit_page(&pages::pending(5678)).await;
    mock.mock_status("GET", PATH_CHAIN, 403, "").await;

    let config = mock.config_with(AuthMethod::Basic, TEST_USERNAME);
    let (pending, forbidden) = tokio::task::spawn_blocking(move || {
        let client = CertsrvClient::new(config).expect("Client creation failed");
        let pending = client
            .get_cert(CSR_PEM, "WebServer", Encoding::Base64)
            .unwrap_err();
        let forbidden = client.get_ca_chain(Encoding::Base64).unwrap_err();
        (pending, forbidden)
    })
    .await
    .expect("blocking task panicked");

    assert_eq!(pending.request_id(), Some(5678));
    assert!(matches!(forbidden, CertsrvError::Transport { status: 403, .. }));
}
