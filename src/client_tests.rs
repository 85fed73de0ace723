// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::Gns3Client;
use crate::error::ErrorCode;

fn client() -> Gns3Client {
    Gns3Client::new(
        "http://localhost:3080".to_string(),
        "admin".to_string(),
        "secret".to_string(),
        true,
    )
}

#[test]
fn base_url_is_stored_verbatim() {
    let c = client();
    assert_eq!(c.base_url, "http://localhost:3080");
}

#[test]
fn not_authenticated_before_login() {
    let c = client();
    assert!(!c.is_authenticated());
}

#[tokio::test]
async fn calls_before_authentication_fail_with_auth_failed() {
    let c = client();
    let err = c.get_projects().await.unwrap_err();
    assert_eq!(err.error_code, ErrorCode::AuthFailed);
}
