//! Bearer Token Gate
//!
//! Checks `Authorization: Bearer <token>` against the configured token
//! before a command reaches the coordinator. With no token configured the
//! gate lets everything through.

use axum::http::{header, HeaderMap};
use subtle::ConstantTimeEq;

/// Outcome of an auth check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    pub authenticated: bool,
    /// Why the request was rejected
    pub reason: Option<String>,
}

impl AuthDecision {
    pub fn allow() -> Self {
        Self {
            authenticated: true,
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            reason: Some(reason.into()),
        }
    }
}

/// Constant-time comparison of two secrets
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Static bearer token check
#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    token: Option<String>,
}

impl AuthGate {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// A gate that accepts every request
    pub fn disabled() -> Self {
        Self { token: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub fn check(&self, headers: &HeaderMap) -> AuthDecision {
        let Some(expected) = self.token.as_deref() else {
            return AuthDecision::allow();
        };

        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return AuthDecision::reject("Missing Authorization header");
        };
        let Some(token) = value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) else {
            return AuthDecision::reject("Invalid Authorization header format");
        };

        if constant_time_str_eq(token.trim(), expected) {
            AuthDecision::allow()
        } else {
            AuthDecision::reject("Invalid token")
        }
    }
}
