//! Action dispatch
//!
//! Each resource owns an [`ActionDispatcher`] that decides, per request,
//! which serializer pair and which permission set apply. Lookups never fail:
//! a missing binding falls back to the default.
//!
//! Lookup order for a request is:
//! 1. the action itself (`partial_update` retries under `update`)
//! 2. the HTTP verb (`Action::Verb`)
//! 3. the default

use crate::core::action::Action;
use crate::core::auth::RequestContext;
use crate::core::entity::Owned;
use crate::core::error::{CatalogResult, RequestError};
use crate::core::permission::PermissionSet;
use crate::core::serializer::SerializerPair;
use axum::http::Method;
use std::collections::HashMap;

/// Look up a binding, falling back to `default`
fn lookup<'a, T>(action: &Action, bindings: &'a HashMap<Action, T>, default: &'a T) -> &'a T {
    bindings
        .get(action)
        .or_else(|| action.fallback().and_then(|f| bindings.get(&f)))
        .unwrap_or(default)
}

/// Select the serializer pair for an action
pub fn resolve_serializer<'a>(
    action: &Action,
    bindings: &'a HashMap<Action, SerializerPair>,
    default: &'a SerializerPair,
) -> &'a SerializerPair {
    lookup(action, bindings, default)
}

/// Select the permission set for an action
pub fn resolve_permissions<'a>(
    action: &Action,
    bindings: &'a HashMap<Action, PermissionSet>,
    default: &'a PermissionSet,
) -> &'a PermissionSet {
    lookup(action, bindings, default)
}

/// Per-action bindings with a default
#[derive(Debug, Clone)]
pub struct Bindings<T> {
    entries: HashMap<Action, T>,
    default: T,
}

impl<T> Bindings<T> {
    pub fn new(default: T) -> Self {
        Self {
            entries: HashMap::new(),
            default,
        }
    }

    /// Builder-style binding
    pub fn bind(mut self, action: impl Into<Action>, value: T) -> Self {
        self.insert(action, value);
        self
    }

    pub fn insert(&mut self, action: impl Into<Action>, value: T) {
        self.entries.insert(action.into(), value);
    }

    /// Exact lookup, no fallback
    pub fn get(&self, action: &Action) -> Option<&T> {
        self.entries.get(action)
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Action lookup with the `partial_update` fallback, then the default
    pub fn resolve(&self, action: &Action) -> &T {
        lookup(action, &self.entries, &self.default)
    }

    /// Full request lookup: action, then verb, then default
    pub fn resolve_request(&self, action: &Action, method: &Method) -> &T {
        self.entries
            .get(action)
            .or_else(|| action.fallback().and_then(|f| self.entries.get(&f)))
            .or_else(|| self.entries.get(&Action::Verb(method.clone())))
            .unwrap_or(&self.default)
    }
}

impl<T: Default> Default for Bindings<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Strategy object resolving serializers and permissions for a resource
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    serializers: Bindings<SerializerPair>,
    permissions: Bindings<PermissionSet>,
}

impl ActionDispatcher {
    pub fn new(default_serializer: SerializerPair, default_permissions: PermissionSet) -> Self {
        Self {
            serializers: Bindings::new(default_serializer),
            permissions: Bindings::new(default_permissions),
        }
    }

    /// Bind a serializer to an action (or verb, via `Action::Verb`)
    pub fn serializer(mut self, action: impl Into<Action>, serializer: SerializerPair) -> Self {
        self.serializers.insert(action, serializer);
        self
    }

    /// Bind a permission set to an action (or verb)
    pub fn permissions(mut self, action: impl Into<Action>, set: impl Into<PermissionSet>) -> Self {
        self.permissions.insert(action, set.into());
        self
    }

    pub fn serializer_for(&self, ctx: &RequestContext) -> &SerializerPair {
        let pair = self.serializers.resolve_request(&ctx.action, &ctx.method);
        tracing::debug!(action = %ctx.action, serializer = pair.name(), "resolved serializer");
        pair
    }

    pub fn permissions_for(&self, ctx: &RequestContext) -> &PermissionSet {
        self.permissions.resolve_request(&ctx.action, &ctx.method)
    }

    /// Collection-level permission check
    pub fn check_permissions(&self, ctx: &RequestContext) -> CatalogResult<()> {
        if self.permissions_for(ctx).has_permission(ctx) {
            Ok(())
        } else {
            Err(deny(ctx))
        }
    }

    /// Record-level permission check
    pub fn check_object_permissions(
        &self,
        ctx: &RequestContext,
        target: &dyn Owned,
    ) -> CatalogResult<()> {
        if self.permissions_for(ctx).has_object_permission(ctx, target) {
            Ok(())
        } else {
            Err(deny(ctx))
        }
    }
}

/// 401 for anonymous requesters, 403 otherwise
fn deny(ctx: &RequestContext) -> crate::core::error::CatalogError {
    tracing::warn!(action = %ctx.action, method = %ctx.method, user = ?ctx.user_id(), "permission denied");
    if ctx.auth.is_anonymous() {
        RequestError::Unauthorized {
            message: "Authentication credentials were not provided".to_string(),
        }
        .into()
    } else {
        RequestError::Forbidden {
            message: "You do not have permission to perform this action".to_string(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::{AuthContext, Principal, Role};
    use crate::core::permission::Policy;
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn pair(name: &str) -> SerializerPair {
        SerializerPair::new(name)
    }

    #[test]
    fn test_resolve_absent_action_uses_default() {
        let mut bindings = HashMap::new();
        bindings.insert(Action::Create, pair("create"));
        let default = pair("default");
        assert_eq!(resolve_serializer(&Action::List, &bindings, &default).name(), "default");
        assert_eq!(resolve_serializer(&Action::Create, &bindings, &default).name(), "create");
    }

    #[test]
    fn test_partial_update_falls_back_to_update() {
        let mut bindings = HashMap::new();
        bindings.insert(Action::Update, pair("update"));
        let default = pair("default");
        assert_eq!(
            resolve_serializer(&Action::PartialUpdate, &bindings, &default).name(),
            "update"
        );
        assert_eq!(
            resolve_serializer(&Action::parse("update_partial"), &bindings, &default).name(),
            "update"
        );
    }

    #[test]
    fn test_partial_update_prefers_own_binding() {
        let mut bindings = HashMap::new();
        bindings.insert(Action::Update, pair("update"));
        bindings.insert(Action::PartialUpdate, pair("partial"));
        let default = pair("default");
        assert_eq!(
            resolve_serializer(&Action::PartialUpdate, &bindings, &default).name(),
            "partial"
        );
    }

    #[test]
    fn test_resolve_permissions_same_rules() {
        let mut bindings = HashMap::new();
        bindings.insert(Action::Update, PermissionSet::new(vec![Policy::IsAuthenticated]));
        let default = PermissionSet::allow_any();
        let resolved = resolve_permissions(&Action::PartialUpdate, &bindings, &default);
        assert_eq!(resolved.policies().len(), 1);
        assert!(matches!(resolved.policies()[0], Policy::IsAuthenticated));
        let resolved = resolve_permissions(&Action::Destroy, &bindings, &default);
        assert!(matches!(resolved.policies()[0], Policy::AllowAny));
    }

    #[test]
    fn test_request_lookup_falls_back_to_verb() {
        let bindings = Bindings::new(pair("default"))
            .bind(Action::Verb(Method::GET), pair("read"))
            .bind(Action::Create, pair("create"));
        assert_eq!(bindings.resolve_request(&Action::List, &Method::GET).name(), "read");
        assert_eq!(bindings.resolve_request(&Action::Create, &Method::POST).name(), "create");
        assert_eq!(bindings.resolve_request(&Action::Destroy, &Method::DELETE).name(), "default");
    }

    #[test]
    fn test_action_beats_verb() {
        let bindings = Bindings::new(pair("default"))
            .bind("PATCH", pair("by-verb"))
            .bind("update", pair("update"));
        assert_eq!(
            bindings.resolve_request(&Action::PartialUpdate, &Method::PATCH).name(),
            "update"
        );
    }

    #[test]
    fn test_bindings_exact_get() {
        let bindings = Bindings::new(pair("default")).bind("update", pair("update"));
        assert!(bindings.get(&Action::PartialUpdate).is_none());
        assert_eq!(bindings.resolve(&Action::PartialUpdate).name(), "update");
        assert_eq!(bindings.default_value().name(), "default");
    }

    fn seller_ctx(method: Method, action: Action) -> RequestContext {
        RequestContext::new(
            method,
            action,
            AuthContext::User(Principal {
                user_id: Uuid::new_v4(),
                username: "s".into(),
                role: Role::Customer,
                is_superuser: false,
            }),
        )
    }

    #[test]
    fn test_denial_status_depends_on_requester() {
        let dispatcher = ActionDispatcher::new(
            pair("default"),
            PermissionSet::new(vec![Policy::ReadOnlyOrRole(Role::Seller)]),
        );

        let anon = RequestContext::new(Method::POST, Action::Create, AuthContext::Anonymous);
        let err = dispatcher.check_permissions(&anon).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let customer = seller_ctx(Method::POST, Action::Create);
        let err = dispatcher.check_permissions(&customer).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let read = RequestContext::new(Method::GET, Action::List, AuthContext::Anonymous);
        assert!(dispatcher.check_permissions(&read).is_ok());
    }

    #[test]
    fn test_dispatcher_bindings() {
        let dispatcher = ActionDispatcher::new(pair("default"), PermissionSet::allow_any())
            .serializer(Action::List, pair("list"))
            .permissions(Action::Destroy, Policy::IsAuthenticated);

        let list = RequestContext::new(Method::GET, Action::List, AuthContext::Anonymous);
        assert_eq!(dispatcher.serializer_for(&list).name(), "list");

        let destroy = RequestContext::new(Method::DELETE, Action::Destroy, AuthContext::Anonymous);
        assert_eq!(dispatcher.serializer_for(&destroy).name(), "default");
        assert!(dispatcher.check_permissions(&destroy).is_err());
    }
}
