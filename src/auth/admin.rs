use std::fmt;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::AppError;

/// The shared admin password.
///
/// Passing the check only unlocks upload/delete affordances in the client; the
/// document endpoints themselves do not require it. Real authorization is left
/// to whatever sits in front of the service.
#[derive(Clone)]
pub struct AdminSecret(Arc<str>);

impl AdminSecret {
    /// Wrap the configured password. An empty password is rejected.
    pub fn new(secret: impl AsRef<str>) -> Result<Self, AppError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(AppError::Config("ADMIN_PASSWORD must not be empty".into()));
        }
        Ok(Self(Arc::from(secret)))
    }

    /// Exact, case-sensitive comparison against the configured password.
    pub fn verify(&self, candidate: &str) -> bool {
        &*self.0 == candidate
    }
}

impl fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminSecret(<redacted>)")
    }
}

/// Request body for `POST /api/auth`.
#[derive(Debug, Default, Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub password: Option<String>,
}

/// Response body for `POST /api/auth`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
}

/// `POST /api/auth` — checks the submitted password.
///
/// Answers 200 `{success: true}` on a match and 401 `{success: false}`
/// otherwise. An unreadable body counts as a wrong password.
pub async fn auth_handler(
    State(state): State<AppState>,
    payload: Result<axum::Json<AuthRequest>, JsonRejection>,
) -> (StatusCode, axum::Json<AuthResponse>) {
    let request = match payload {
        Ok(axum::Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Unreadable auth request: {rejection}");
            AuthRequest::default()
        }
    };

    let success = request
        .password
        .as_deref()
        .is_some_and(|password| state.admin_secret.verify(password));

    if success {
        tracing::info!("Admin password accepted");
        (StatusCode::OK, axum::Json(AuthResponse { success }))
    } else {
        tracing::warn!("Admin password rejected");
        (StatusCode::UNAUTHORIZED, axum::Json(AuthResponse { success }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_exact_match() {
        let secret = AdminSecret::new("KaiPassword").unwrap();
        assert!(secret.verify("KaiPassword"));
    }

    #[test]
    fn test_verify_is_case_sensitive() {
        let secret = AdminSecret::new("KaiPassword").unwrap();
        assert!(!secret.verify("kaipassword"));
        assert!(!secret.verify("KAIPASSWORD"));
    }

    #[test]
    fn test_verify_rejects_prefix_and_padding() {
        let secret = AdminSecret::new("secret").unwrap();
        assert!(!secret.verify("secre"));
        assert!(!secret.verify("secret "));
        assert!(!secret.verify(""));
    }

    #[test]
    fn test_empty_secret_rejected() {
        match AdminSecret::new("") {
            Err(AppError::Config(msg)) => assert!(msg.contains("ADMIN_PASSWORD")),
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    #[test]
    fn test_debug_does_not_leak() {
        let secret = AdminSecret::new("hunter2").unwrap();
        assert!(!format!("{secret:?}").contains("hunter2"));
    }
}
