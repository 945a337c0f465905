use tracing::{info, warn};

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, UpdateProfileRequest},
    password::{hash_password, verify_password},
    repo_types::{Account, NewAccount, ProfileUpdate},
};
use crate::{
    db::{StoreError, UniqueKey},
    error::ApiError,
    state::AppState,
    validation::{check_len, check_optional_len, is_valid_email, non_blank},
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const EMAIL_IN_USE: &str = "Email already in use";

fn validate_email(email: &str) -> Result<(), ApiError> {
    if !is_valid_email(email) {
        return Err(ApiError::validation("Invalid email"));
    }
    check_len("Email", email, 0, 100)
}

fn validate_names(first: Option<&str>, last: Option<&str>) -> Result<(), ApiError> {
    check_optional_len("First name", first, 50)?;
    check_optional_len("Last name", last, 50)
}

fn issue(state: &AppState, account: Account) -> Result<AuthResponse, ApiError> {
    let token = state
        .jwt
        .sign(account.id, &account.username, &account.email)?;
    Ok(AuthResponse {
        token,
        user: account.into(),
    })
}

pub async fn register(state: &AppState, req: RegisterRequest) -> Result<AuthResponse, ApiError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();
    let first_name = non_blank(req.first_name);
    let last_name = non_blank(req.last_name);

    check_len("Username", &username, 3, 50)?;
    validate_email(&email)?;
    check_len("Password", &req.password, 6, 100)?;
    validate_names(first_name.as_deref(), last_name.as_deref())?;

    if state.accounts.username_exists(&username).await? {
        warn!(%username, "username already taken");
        return Err(ApiError::Conflict("Username already taken".into()));
    }
    if state.accounts.email_exists(&email).await? {
        warn!(%email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&req.password)?;

    // The unique constraints still decide a race between two registrations.
    let account = state
        .accounts
        .create(NewAccount {
            username,
            email,
            password_hash,
            first_name,
            last_name,
        })
        .await?;

    info!(account_id = account.id, username = %account.username, "account registered");
    issue(state, account)
}

pub async fn login(state: &AppState, req: LoginRequest) -> Result<AuthResponse, ApiError> {
    let identifier = req.username_or_email.trim();
    if identifier.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation(
            "Username or email and password are required",
        ));
    }

    let Some(account) = state.accounts.find_by_login(identifier).await? else {
        warn!(%identifier, "login for unknown account");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password(&req.password, &account.password_hash) {
        warn!(account_id = account.id, "login with invalid password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let account = state
        .accounts
        .record_login(account.id)
        .await?
        .unwrap_or(account);

    info!(account_id = account.id, username = %account.username, "account logged in");
    issue(state, account)
}

pub async fn profile(state: &AppState, account_id: i64) -> Result<PublicUser, ApiError> {
    state
        .accounts
        .find_by_id(account_id)
        .await?
        .map(PublicUser::from)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// A profile update that loses the race for an email reports the same
/// conflict as the pre-check.
fn profile_conflict(err: StoreError) -> ApiError {
    match err {
        StoreError::Duplicate(UniqueKey::Email) => ApiError::Conflict(EMAIL_IN_USE.into()),
        other => other.into(),
    }
}

pub async fn update_profile(
    state: &AppState,
    account_id: i64,
    req: UpdateProfileRequest,
) -> Result<PublicUser, ApiError> {
    let new_email = non_blank(req.email).map(|e| e.to_lowercase());
    if let Some(email) = &new_email {
        validate_email(email)?;
    }
    // A provided name replaces the stored one; blank clears it.
    let first_name = req.first_name.map(|v| non_blank(Some(v)));
    let last_name = req.last_name.map(|v| non_blank(Some(v)));
    validate_names(
        first_name.as_ref().and_then(|v| v.as_deref()),
        last_name.as_ref().and_then(|v| v.as_deref()),
    )?;

    let current = state
        .accounts
        .find_by_id(account_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let email = match new_email {
        Some(email) if email != current.email => {
            if state.accounts.email_exists(&email).await? {
                warn!(account_id, %email, "email already in use");
                return Err(ApiError::Conflict(EMAIL_IN_USE.into()));
            }
            email
        }
        _ => current.email.clone(),
    };

    let update = ProfileUpdate {
        email,
        first_name: first_name.unwrap_or(current.first_name),
        last_name: last_name.unwrap_or(current.last_name),
    };

    let account = state
        .accounts
        .update_profile(account_id, update)
        .await
        .map_err(profile_conflict)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    info!(account_id, "profile updated");
    Ok(account.into())
}
