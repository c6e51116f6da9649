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

//! Integration tests for GET certnew.cer and certnew.p7b

use crate::integration::{
    fixtures, pages, MockCertsrvServer, CONTENT_TYPE_PKCS7, PATH_CERTIFICATE, PATH_CHAIN,
};
use certsrv_client::{CertificateData, CertsrvError, Encoding, RequestOutcome};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_existing_certificate() {
    let mock = MockCertsrvServer::start().await;
    mock.mock_certificate("42", fixtures::CERT_PEM.as_bytes()).await;

    let client = mock.client();
    let cert = client
        .get_existing_cert(42, Encoding::Base64)
        .await
        .expect("get_existing_cert failed");

    assert_eq!(cert.as_text(), Some(fixtures::CERT_PEM));
}

#[tokio::test]
async fn test_existing_certificate_not_found() {
    let mock = MockCertsrvServer::start().await;
    mock.mock_download_error_page(
        PATH_CERTIFICATE,
        &pages::denied("The request ID 99 is not valid"),
    )
    .await;

    let client = mock.client();

    let outcome = client
        .fetch_existing_cert(99, Encoding::Base64)
        .await
        .expect("fetch failed");
    assert_eq!(
        outcome,
        RequestOutcome::RetrievalFailed {
            reason: "The request ID 99 is not valid".to_string()
        }
    );

    let err = client
        .get_existing_cert(99, Encoding::Base64)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CertsrvError::CertificateRetrieval(ref r) if r == "The request ID 99 is not valid"
    ));
}

#[tokio::test]
async fn test_ca_certificate_query() {
    let mock = MockCertsrvServer::start().await;

    Mock::given(method("GET"))
        .and(path(PATH_CERTIFICATE))
        .and(query_param("ReqID", "CACert"))
        .and(query_param("Enc", "b64"))
        .and(query_param("Renewal", "-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(fixtures::CERT_PEM.as_bytes().to_vec())
                .insert_header("Content-Type", "application/pkix-cert"),
        )
        .expect(1)
        .mount(mock.inner())
        .await;

    let client = mock.client();
    let cert = client
        .get_ca_cert(Encoding::Base64)
        .await
        .expect("get_ca_cert failed");

    assert_eq!(cert, CertificateData::Text(fixtures::CERT_PEM.to_string()));
}

#[tokio::test]
async fn test_ca_certificate_binary() {
    let mock = MockCertsrvServer::start().await;
    mock.mock_certificate("CACert", fixtures::CERT_DER).await;

    let client = mock.client();
    let cert = client
        .get_ca_cert(Encoding::Binary)
        .await
        .expect("get_ca_cert failed");

    assert_eq!(cert, CertificateData::Binary(fixtures::CERT_DER.to_vec()));
    assert_eq!(cert.to_der().unwrap(), fixtures::CERT_DER);
}

#[tokio::test]
async fn test_ca_chain() {
    let mock = MockCertsrvServer::start().await;
    mock.mock_chain(fixtures::CHAIN_PEM.as_bytes()).await;

    let client = mock.client();
    let chain = client
        .get_ca_chain(Encoding::Base64)
        .await
        .expect("get_ca_chain failed");

    assert_eq!(chain.as_text(), Some(fixtures::CHAIN_PEM));
}

#[tokio::test]
async fn test_ca_chain_rejects_certificate_content_type() {
    let mock = MockCertsrvServer::start().await;

    Mock::given(method("GET"))
        .and(path(PATH_CHAIN))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(fixtures::CHAIN_PEM.as_bytes().to_vec())
                .insert_header("Content-Type", "application/pkix-cert"),
        )
        .mount(mock.inner())
        .await;

    let client = mock.client();
    let outcome = client
        .fetch_ca_chain(Encoding::Base64)
        .await
        .expect("fetch failed");

    assert_eq!(
        outcome,
        RequestOutcome::RetrievalFailed {
            reason: "An unknown error occurred.".to_string()
        }
    );
}

#[tokio::test]
async fn test_content_type_parameters_are_a_mismatch() {
    let mock = MockCertsrvServer::start().await;

    Mock::given(method("GET"))
        .and(path(PATH_CHAIN))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(fixtures::CHAIN_PEM.as_bytes().to_vec())
                .insert_header("Content-Type", format!("{}; charset=utf-8", CONTENT_TYPE_PKCS7)),
        )
        .mount(mock.inner())
        .await;

    let client = mock.client();
    let err = client.get_ca_chain(Encoding::Base64).await.unwrap_err();

    assert!(matches!(err, CertsrvError::CertificateRetrieval(_)));
}
