//! Authentication context for catalog requests
//!
//! Every handler receives an explicit [`RequestContext`]: the HTTP method, the
//! resolved action and who is asking. Providers turn request headers into an
//! [`AuthContext`].

use crate::core::action::Action;
use crate::core::error::CatalogResult;
use async_trait::async_trait;
use axum::http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role carried by a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Seller,
    #[default]
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Seller => "seller",
            Role::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated requester
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub is_superuser: bool,
}

impl Principal {
    /// Superusers satisfy every role requirement
    pub fn has_role(&self, role: Role) -> bool {
        self.is_superuser || self.role == role
    }
}

/// Who is making a request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthContext {
    /// No credentials were presented
    #[default]
    Anonymous,

    /// A token resolved to this user
    User(Principal),
}

impl AuthContext {
    /// Get user_id if available
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::User(principal) => Some(principal.user_id),
            AuthContext::Anonymous => None,
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            AuthContext::User(principal) => Some(principal),
            AuthContext::Anonymous => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, AuthContext::Anonymous)
    }

    pub fn is_superuser(&self) -> bool {
        self.principal().is_some_and(|p| p.is_superuser)
    }
}

/// Everything the dispatcher and the policies need to know about a request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub action: Action,
    pub auth: AuthContext,
}

impl RequestContext {
    pub fn new(method: Method, action: Action, auth: AuthContext) -> Self {
        Self {
            method,
            action,
            auth,
        }
    }

    /// GET, HEAD and OPTIONS never modify state
    pub fn is_read_only(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD | Method::OPTIONS)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.auth.user_id()
    }
}

/// Trait for auth providers
///
/// A missing credential yields [`AuthContext::Anonymous`]; a credential that
/// is present but not recognised is an error (401).
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Extract auth context from request headers
    async fn extract_context(&self, headers: &HeaderMap) -> CatalogResult<AuthContext>;
}

/// Provider that treats every request as anonymous
pub struct NoAuthProvider;

#[async_trait]
impl AuthProvider for NoAuthProvider {
    async fn extract_context(&self, _headers: &HeaderMap) -> CatalogResult<AuthContext> {
        Ok(AuthContext::Anonymous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role, is_superuser: bool) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            role,
            is_superuser,
        }
    }

    #[test]
    fn test_superuser_has_every_role() {
        let root = principal(Role::Customer, true);
        assert!(root.has_role(Role::Seller));
        assert!(root.has_role(Role::Admin));

        let seller = principal(Role::Seller, false);
        assert!(seller.has_role(Role::Seller));
        assert!(!seller.has_role(Role::Admin));
    }

    #[test]
    fn test_auth_context_accessors() {
        let p = principal(Role::Seller, false);
        let ctx = AuthContext::User(p.clone());
        assert_eq!(ctx.user_id(), Some(p.user_id));
        assert!(!ctx.is_anonymous());
        assert!(!ctx.is_superuser());

        assert_eq!(AuthContext::Anonymous.user_id(), None);
        assert!(AuthContext::Anonymous.is_anonymous());
    }

    #[test]
    fn test_read_only_methods() {
        for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
            let ctx = RequestContext::new(method, Action::List, AuthContext::Anonymous);
            assert!(ctx.is_read_only());
        }
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            let ctx = RequestContext::new(method, Action::Create, AuthContext::Anonymous);
            assert!(!ctx.is_read_only());
        }
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Seller).unwrap(), "\"seller\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert_eq!(Role::default(), Role::Customer);
    }

    #[tokio::test]
    async fn test_no_auth_provider_extract_context() {
        let provider = NoAuthProvider;
        let ctx = provider
            .extract_context(&HeaderMap::new())
            .await
            .expect("extract_context should succeed");
        assert_eq!(ctx, AuthContext::Anonymous);
    }
}
