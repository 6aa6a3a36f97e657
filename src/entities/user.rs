//! User accounts

use crate::core::auth::{Principal, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,

    /// Argon2 PHC string; never leaves the process
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

crate::impl_entity!(User, "users", "user");

impl User {
    pub fn new(username: impl Into<String>, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        let mut user = Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash,
            role,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        };
        user.normalize_admin();
        user
    }

    /// Admins are superusers and superusers are admins
    ///
    /// Must run before every save.
    pub fn normalize_admin(&mut self) {
        if self.role == Role::Admin || self.is_superuser {
            self.role = Role::Admin;
            self.is_superuser = true;
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            username: self.username.clone(),
            role: self.role,
            is_superuser: self.is_superuser,
        }
    }
}

/// Public projection of a user
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReadUser {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&User> for ReadUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_role_implies_superuser() {
        let user = User::new("root", String::new(), Role::Admin);
        assert!(user.is_superuser);
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn test_superuser_implies_admin_role() {
        let mut user = User::new("ops", String::new(), Role::Customer);
        assert!(!user.is_superuser);
        user.is_superuser = true;
        user.normalize_admin();
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn test_seller_untouched() {
        let user = User::new("shop", String::new(), Role::Seller);
        assert_eq!(user.role, Role::Seller);
        assert!(!user.is_superuser);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User::new("shop", "$argon2id$secret".to_string(), Role::Seller);
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "seller");
    }

    #[test]
    fn test_read_user_projection() {
        let mut user = User::new("shop", String::new(), Role::Seller);
        user.email = "shop@example.com".to_string();
        let read = serde_json::to_value(ReadUser::from(&user)).unwrap();
        let keys: Vec<&String> = read.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 5);
        assert_eq!(read["email"], "shop@example.com");
    }
}
