use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::Account;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Request body for `PUT /auth/me`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Response returned after login or register.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Public part of the account returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login_at: Option<OffsetDateTime>,
}

impl From<Account> for PublicUser {
    fn from(a: Account) -> Self {
        Self {
            full_name: a.full_name(),
            id: a.id,
            username: a.username,
            email: a.email,
            first_name: a.first_name,
            last_name: a.last_name,
            created_at: a.created_at,
            last_login_at: a.last_login_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            id: 3,
            username: "alice".into(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            first_name: Some("Alice".into()),
            last_name: None,
            created_at: time::macros::datetime!(2024-05-01 12:00 UTC),
            last_login_at: None,
        }
    }

    #[test]
    fn public_user_is_camel_case_without_hash() {
        let json = serde_json::to_value(PublicUser::from(account())).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["firstName"], "Alice");
        assert_eq!(json["fullName"], "Alice");
        assert_eq!(json["createdAt"], "2024-05-01T12:00:00Z");
        assert!(json["lastLoginAt"].is_null());
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn login_request_reads_camel_case() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"usernameOrEmail":"alice","password":"secret1"}"#).unwrap();
        assert_eq!(req.username_or_email, "alice");
    }
}
