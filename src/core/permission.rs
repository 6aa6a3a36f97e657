//! Permission policies
//!
//! A policy is a predicate over a request and, optionally, the record it
//! targets. Policies are evaluated twice per request: once at collection
//! level before the store is touched, and once per record after it has been
//! loaded. Owner checks only make sense at the second level.

use crate::core::auth::{RequestContext, Role};
use crate::core::entity::Owned;

/// A single permission predicate
#[derive(Debug, Clone)]
pub enum Policy {
    /// Always allowed
    AllowAny,

    /// Requester must not be anonymous
    IsAuthenticated,

    /// Read-only requests, or requesters carrying the role
    ReadOnlyOrRole(Role),

    /// Read-only requests, or superusers
    ReadOnlyOrSuperuser,

    /// Read-only requests, or the record's owner (or a superuser)
    ReadOnlyOrOwner,

    /// Custom predicate
    Custom(fn(&RequestContext) -> bool),
}

impl Policy {
    /// Collection-level check
    ///
    /// `ReadOnlyOrOwner` passes here; it is decided per record by
    /// [`Policy::has_object_permission`].
    pub fn has_permission(&self, ctx: &RequestContext) -> bool {
        match self {
            Policy::AllowAny => true,
            Policy::IsAuthenticated => !ctx.auth.is_anonymous(),
            Policy::ReadOnlyOrRole(role) => {
                ctx.is_read_only() || ctx.auth.principal().is_some_and(|p| p.has_role(*role))
            }
            Policy::ReadOnlyOrSuperuser => ctx.is_read_only() || ctx.auth.is_superuser(),
            Policy::ReadOnlyOrOwner => true,
            Policy::Custom(f) => f(ctx),
        }
    }

    /// Record-level check
    ///
    /// Only `ReadOnlyOrOwner` inspects the record; every other policy was
    /// already decided at collection level.
    pub fn has_object_permission(&self, ctx: &RequestContext, target: &dyn Owned) -> bool {
        match self {
            Policy::ReadOnlyOrOwner => {
                if ctx.is_read_only() || ctx.auth.is_superuser() {
                    return true;
                }
                match (ctx.user_id(), target.owner_id()) {
                    (Some(user), Some(owner)) => user == owner,
                    _ => false,
                }
            }
            _ => true,
        }
    }

    /// Evaluate the policy in one step
    ///
    /// # Panics
    ///
    /// In debug builds, evaluating `ReadOnlyOrOwner` for a write without a
    /// target panics. Release builds deny instead.
    pub fn allows(&self, ctx: &RequestContext, target: Option<&dyn Owned>) -> bool {
        match (self, target) {
            (Policy::ReadOnlyOrOwner, None) => {
                if ctx.is_read_only() {
                    return true;
                }
                tracing::error!(
                    action = %ctx.action,
                    "owner policy evaluated for a write without a target record"
                );
                if cfg!(debug_assertions) {
                    panic!("ReadOnlyOrOwner requires a target record for write requests");
                }
                false
            }
            (policy, None) => policy.has_permission(ctx),
            (policy, Some(target)) => {
                policy.has_permission(ctx) && policy.has_object_permission(ctx, target)
            }
        }
    }
}

/// Ordered set of policies that must all pass
#[derive(Debug, Clone, Default)]
pub struct PermissionSet(Vec<Policy>);

impl PermissionSet {
    pub fn new(policies: Vec<Policy>) -> Self {
        Self(policies)
    }

    /// A set that allows everything
    pub fn allow_any() -> Self {
        Self(vec![Policy::AllowAny])
    }

    pub fn policies(&self) -> &[Policy] {
        &self.0
    }

    pub fn has_permission(&self, ctx: &RequestContext) -> bool {
        self.0.iter().all(|p| p.has_permission(ctx))
    }

    pub fn has_object_permission(&self, ctx: &RequestContext, target: &dyn Owned) -> bool {
        self.0.iter().all(|p| p.has_object_permission(ctx, target))
    }

    /// AND across the set, short-circuiting on the first denial
    pub fn allows(&self, ctx: &RequestContext, target: Option<&dyn Owned>) -> bool {
        self.0.iter().all(|p| p.allows(ctx, target))
    }
}

impl From<Vec<Policy>> for PermissionSet {
    fn from(policies: Vec<Policy>) -> Self {
        Self(policies)
    }
}

impl From<Policy> for PermissionSet {
    fn from(policy: Policy) -> Self {
        Self(vec![policy])
    }
}
