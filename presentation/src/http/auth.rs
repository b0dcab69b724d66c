//! Caller identity from the App Service authentication headers.
//!
//! Behind Easy Auth every request carries the signed-in principal in
//! `x-ms-*` headers. Local runs have no such headers, so a fixed
//! development user stands in for them.

use agentflow_domain::UserId;
use axum::http::HeaderMap;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde_json::Value;
use tracing::{debug, error};

pub const PRINCIPAL_ID_HEADER: &str = "x-ms-client-principal-id";
pub const PRINCIPAL_NAME_HEADER: &str = "x-ms-client-principal-name";
pub const PRINCIPAL_IDP_HEADER: &str = "x-ms-client-principal-idp";
pub const AAD_ID_TOKEN_HEADER: &str = "x-ms-token-aad-id-token";
pub const CLIENT_PRINCIPAL_HEADER: &str = "x-ms-client-principal";

/// Development identity used when no principal headers are present
pub mod sample_user {
    pub const PRINCIPAL_ID: &str = "00000000-0000-0000-0000-000000000000";
    pub const PRINCIPAL_NAME: &str = "testusername@contoso.com";
    pub const PRINCIPAL_IDP: &str = "aad";
    pub const AAD_ID_TOKEN: &str = "your_aad_id_token";
    /// `{"auth_typ":"aad","name_typ":"name","role_typ":"roles","tid":"72f988bf-..."}`
    pub const CLIENT_PRINCIPAL: &str = "eyJhdXRoX3R5cCI6ImFhZCIsIm5hbWVfdHlwIjoibmFtZSIsInJvbGVfdHlwIjoicm9sZXMiLCJ0aWQiOiI3MmY5ODhiZi0wMDAwLTAwMDAtMDAwMC0yZDdjZDAxMWRiNDcifQ==";
}

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetails {
    pub user_principal_id: String,
    pub user_name: String,
    pub auth_provider: String,
    pub auth_token: String,
    pub client_principal_b64: String,
    pub aad_id_token: String,
}

impl UserDetails {
    pub fn user_id(&self) -> UserId {
        UserId::new(self.user_principal_id.clone())
    }

    fn sample() -> Self {
        Self {
            user_principal_id: sample_user::PRINCIPAL_ID.to_string(),
            user_name: sample_user::PRINCIPAL_NAME.to_string(),
            auth_provider: sample_user::PRINCIPAL_IDP.to_string(),
            auth_token: sample_user::AAD_ID_TOKEN.to_string(),
            client_principal_b64: sample_user::CLIENT_PRINCIPAL.to_string(),
            aad_id_token: sample_user::AAD_ID_TOKEN.to_string(),
        }
    }
}

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Read the caller from the request headers.
///
/// Without a principal id header the development sample user is returned.
/// A present but empty id yields an empty user id, which handlers reject.
pub fn get_authenticated_user_details(headers: &HeaderMap) -> UserDetails {
    if !headers.contains_key(PRINCIPAL_ID_HEADER) {
        debug!("No user principal found in headers, using the sample user");
        return UserDetails::sample();
    }

    let aad_id_token = header(headers, AAD_ID_TOKEN_HEADER);
    UserDetails {
        user_principal_id: header(headers, PRINCIPAL_ID_HEADER),
        user_name: header(headers, PRINCIPAL_NAME_HEADER),
        auth_provider: header(headers, PRINCIPAL_IDP_HEADER),
        auth_token: aad_id_token.clone(),
        client_principal_b64: header(headers, CLIENT_PRINCIPAL_HEADER),
        aad_id_token,
    }
}

/// Tenant id (`tid`) from a base64 client principal, or `""` when it cannot
/// be decoded.
pub fn get_tenantid(client_principal_b64: &str) -> String {
    let decoded = match BASE64.decode(client_principal_b64) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Exception decoding client principal: {e}");
            return String::new();
        }
    };
    match serde_json::from_slice::<Value>(&decoded) {
        Ok(principal) => principal
            .get("tid")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Err(e) => {
            error!("Exception parsing client principal: {e}");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_missing_headers_use_sample_user() {
        let user = get_authenticated_user_details(&HeaderMap::new());
        assert_eq!(user.user_principal_id, sample_user::PRINCIPAL_ID);
        assert_eq!(user.auth_token, user.aad_id_token);
        assert!(!get_tenantid(&user.client_principal_b64).is_empty());
    }

    #[test]
    fn test_headers_are_read() {
        let mut headers = HeaderMap::new();
        headers.insert(PRINCIPAL_ID_HEADER, HeaderValue::from_static("real-id"));
        headers.insert(PRINCIPAL_NAME_HEADER, HeaderValue::from_static("real-name"));
        headers.insert(PRINCIPAL_IDP_HEADER, HeaderValue::from_static("real-idp"));
        headers.insert(AAD_ID_TOKEN_HEADER, HeaderValue::from_static("real-token"));
        headers.insert(CLIENT_PRINCIPAL_HEADER, HeaderValue::from_static("b64payload"));

        let user = get_authenticated_user_details(&headers);
        assert_eq!(
            user,
            UserDetails {
                user_principal_id: "real-id".into(),
                user_name: "real-name".into(),
                auth_provider: "real-idp".into(),
                auth_token: "real-token".into(),
                client_principal_b64: "b64payload".into(),
                aad_id_token: "real-token".into(),
            }
        );
        assert_eq!(user.user_id().as_str(), "real-id");
    }

    #[test]
    fn test_empty_principal_id_is_kept_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(PRINCIPAL_ID_HEADER, HeaderValue::from_static(""));
        assert!(get_authenticated_user_details(&headers).user_principal_id.is_empty());
    }

    #[test]
    fn test_get_tenantid() {
        assert_eq!(get_tenantid("eyJ0aWQiOiJ0ZW5hbnQxMjMifQ=="), "tenant123");
        assert_eq!(get_tenantid("not-a-valid-b64!!"), "");
        // valid base64, not JSON
        assert_eq!(get_tenantid("aGVsbG8="), "");
    }
}
