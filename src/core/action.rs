//! Resource actions used as dispatch keys
//!
//! An action is derived per request from the route and the HTTP verb. Named
//! actions cover the standard viewset operations plus custom routes such as
//! `mine`; verb keys allow bindings "by method".

use axum::http::Method;
use std::fmt;

/// Lookup key for serializer and permission bindings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
    BulkDestroy,
    /// A custom route (e.g. `mine`)
    Named(String),
    /// Binding keyed on the HTTP verb alone
    Verb(Method),
}

impl Action {
    /// Parse an action name
    ///
    /// `update_partial` is accepted as an alias of `partial_update`, and
    /// `multi_delete` of `bulk_destroy`. Upper-case standard verbs become
    /// verb keys; anything else is a named action.
    pub fn parse(name: &str) -> Self {
        match name {
            "list" => Action::List,
            "retrieve" => Action::Retrieve,
            "create" => Action::Create,
            "update" => Action::Update,
            "partial_update" | "update_partial" => Action::PartialUpdate,
            "destroy" => Action::Destroy,
            "bulk_destroy" | "multi_delete" => Action::BulkDestroy,
            "GET" => Action::Verb(Method::GET),
            "POST" => Action::Verb(Method::POST),
            "PUT" => Action::Verb(Method::PUT),
            "PATCH" => Action::Verb(Method::PATCH),
            "DELETE" => Action::Verb(Method::DELETE),
            "HEAD" => Action::Verb(Method::HEAD),
            "OPTIONS" => Action::Verb(Method::OPTIONS),
            other => Action::Named(other.to_string()),
        }
    }

    /// Standard action for a route
    ///
    /// `on_item` is true for `/{resource}/{id}` routes.
    pub fn from_route(method: &Method, on_item: bool) -> Option<Self> {
        let action = match (on_item, method.as_str()) {
            (false, "GET") | (false, "HEAD") => Action::List,
            (false, "POST") => Action::Create,
            (false, "DELETE") => Action::BulkDestroy,
            (true, "GET") | (true, "HEAD") => Action::Retrieve,
            (true, "PUT") => Action::Update,
            (true, "PATCH") => Action::PartialUpdate,
            (true, "DELETE") => Action::Destroy,
            _ => return None,
        };
        Some(action)
    }

    /// The key tried after this one before falling back to the default
    ///
    /// Only `partial_update` has one: it reuses the `update` binding.
    pub fn fallback(&self) -> Option<Action> {
        match self {
            Action::PartialUpdate => Some(Action::Update),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::List => "list",
            Action::Retrieve => "retrieve",
            Action::Create => "create",
            Action::Update => "update",
            Action::PartialUpdate => "partial_update",
            Action::Destroy => "destroy",
            Action::BulkDestroy => "bulk_destroy",
            Action::Named(name) => name,
            Action::Verb(method) => method.as_str(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        Action::parse(name)
    }
}

impl From<Method> for Action {
    fn from(method: Method) -> Self {
        Action::Verb(method)
    }
}
