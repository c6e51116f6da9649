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

//! Integration tests for HTTP status handling

use crate::integration::{pages, MockCertsrvServer, PATH_CERTIFICATE, PATH_CHAIN, PATH_SUBMIT};
use certsrv_client::{CertificateRequest, CertsrvError, Encoding, RequestOutcome};

const CSR_PEM: &str =
    "-----BEGIN CERTIFICATE REQUEST-----\nMIIB\n-----END CERTIFICATE REQUEST-----\n";

#[tokio::test]
async fn test_forbidden_submission_is_transport_error() {
    let mock = MockCertsrvServer::start().await;
    // The body must not be interpreted, even if it looks like an issued page.
    let page = pages::issued(1234);
    mock.mock_status("POST", PATH_SUBMIT, 403, &page).await;

    let client = mock.client();
    let err = client
        .submit(&CertificateRequest::new(CSR_PEM, "WebServer"))
        .await
        .unwrap_err();

    match err {
        CertsrvError::Transport { status, reason } => {
            assert_eq!(status, 403);
            assert_eq!(reason, "Forbidden");
        }
        other => panic!("Expected Transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_forbidden_download_is_transport_error() {
    let mock = MockCertsrvServer::start().await;
    let page = pages::issued(1);
    mock.mock_status("GET", PATH_CHAIN, 403, &page).await;

    let client = mock.client();
    let err = client.get_ca_chain(Encoding::Base64).await.unwrap_err();

    match err {
        CertsrvError::Transport { status, reason } => {
            assert_eq!(status, 403);
            assert_eq!(reason, "Forbidden");
        }
        other => panic!("Expected Transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_on_download() {
    let mock = MockCertsrvServer::start().await;
    let page = "<HTML>Internal Server Error</HTML>";
    mock.mock_status("GET", PATH_CHAIN, 500, page).await;

    let client = mock.client();
    let err = client.get_ca_chain(Encoding::Base64).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(
        err.to_string(),
        "HTTP status 500 returned with reason Internal Server Error"
    );
}

#[tokio::test]
async fn test_unexpected_success_status_on_get() {
    let mock = MockCertsrvServer::start().await;
    mock.mock_status("GET", PATH_CERTIFICATE, 201, "").await;

    let client = mock.client();
    let outcome = client
        .fetch_ca_cert(Encoding::Base64)
        .await
        .expect("fetch failed");

    assert_eq!(
        outcome,
        RequestOutcome::UnexpectedStatus {
            code: 201,
            reason: "Created".to_string()
        }
    );

    let err = client.get_ca_cert(Encoding::Base64).await.unwrap_err();
    assert!(matches!(err, CertsrvError::UnexpectedStatus { status: 201, .. }));
}

#[tokio::test]
async fn test_unexpected_success_status_on_post() {
    let mock = MockCertsrvServer::start().await;
    let page = pages::pending(1);
    mock.mock_status("POST", PATH_SUBMIT, 202, &page).await;

    let client = mock.client();
    let outcome = client
        .submit(&CertificateRequest::new(CSR_PEM, "WebServer"))
        .await
        .expect("submit failed");

    assert_eq!(
        outcome,
        RequestOutcome::UnexpectedStatus {
            code: 202,
            reason: "Accepted".to_string()
        }
    );
}

#[tokio::test]
async fn test_accepted_post_statuses() {
    for status in [201u16, 204] {
        let mock = MockCertsrvServer::start().await;
        let page = pages::pending(77);
        mock.mock_status("POST", PATH_SUBMIT, status, &page).await;

        let client = mock.client();
        let request = CertificateRequest::new(CSR_PEM, "WebServer");
        let result = client.submit(&request).await;

        match (status, result) {
            (201, Ok(outcome)) => assert_eq!(outcome.request_id(), Some(77)),
            // A 204 carries no page, so nothing identifies the outcome.
            (204, Ok(RequestOutcome::Denied { reason })) => {
                assert_eq!(reason, "An unknown error occurred.")
            }
            (status, other) => panic!("status {}: unexpected result {:?}", status, other),
        }
    }
}
