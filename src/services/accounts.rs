use crate::models::errors::AppError;
use crate::models::user::{Role, User};
use crate::services::database::Database;
use crate::services::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

const MAX_NAME_LEN: usize = 100;
const MAX_PASSWORD_LEN: usize = 128;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

/// Trims and lowercases an email, rejecting malformed addresses
pub fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();

    if email.is_empty() {
        return Err(AppError::validation_failed("Email is required"));
    }
    if !email_regex().is_match(&email) {
        return Err(AppError::validation_failed("Email address is invalid"));
    }
    Ok(email)
}

pub fn normalize_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(AppError::validation_failed("Name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation_failed(format!(
            "Name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation_failed(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if password.chars().count() > MAX_PASSWORD_LEN {
        return Err(AppError::validation_failed(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Creates an account after validating every field
pub async fn register(
    db: &Database,
    email: &str,
    name: &str,
    password: &str,
    role: Role,
) -> Result<User, AppError> {
    let email = normalize_email(email)?;
    let name = normalize_name(name)?;
    validate_password(password)?;

    let user = db
        .insert_user(User::new(email, name, hash_password(password), role))
        .await?;

    tracing::info!("Registered {:?} account {}", user.role, user.id);
    Ok(user)
}

/// Checks credentials. Unknown emails and wrong passwords fail the same way.
pub async fn authenticate(db: &Database, email: &str, password: &str) -> Result<User, AppError> {
    let invalid = || AppError::unauthenticated("Invalid email or password");

    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::validation_failed("Email and password are required"));
    }

    let user = db.find_user_by_email(email).await.ok_or_else(invalid)?;

    if !verify_password(password, &user.password_hash) {
        tracing::debug!("Password mismatch for user {}", user.id);
        return Err(invalid());
    }

    Ok(user)
}

/// Replaces a user's password after verifying the current one
pub async fn change_password(
    db: &Database,
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
) -> Result<(), AppError> {
    let user = db
        .find_user(user_id)
        .await
        .ok_or_else(|| AppError::not_found("User"))?;

    if current_password.is_empty() {
        return Err(AppError::validation_failed("Current password is required"));
    }
    validate_password(new_password)?;

    if !verify_password(current_password, &user.password_hash) {
        return Err(AppError::validation_failed("Current password is incorrect"));
    }
    if current_password == new_password {
        return Err(AppError::validation_failed(
            "New password must differ from the current password",
        ));
    }

    db.update_password_hash(user_id, hash_password(new_password))
        .await?;

    tracing::info!("Password changed for user {}", user_id);
    Ok(())
}

/// Creates the bootstrap admin account unless the email is already taken.
/// Returns whether an account was created.
pub async fn ensure_admin(db: &Database, email: &str, password: &str) -> Result<bool, AppError> {
    let email = normalize_email(email)?;

    if db.find_user_by_email(&email).await.is_some() {
        tracing::debug!("Admin account {} already exists", email);
        return Ok(false);
    }

    register(db, &email, "Administrator", password, Role::Admin).await?;
    Ok(true)
}
