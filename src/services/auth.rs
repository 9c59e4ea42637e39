//! Authentication service: password hashing, JWT, login and self-service profile.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application_user::{
    ApplicationUser, ChangePassword, Permission, RegisterAccount, UpdateProfile,
};
use crate::services::application_user::{self as account_service, username_conflict, NewAccount};

const ACCOUNT_COLUMNS: &str = "id, full_name, user_name, password_hash, permission, date_assigned";

/// JWT claims embedded in access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub user_id: String,
    pub permission: String,
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token pair returned on successful login.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Hash a plaintext password with argon2id.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn claims_for(user: &ApplicationUser, token_type: &str, now: i64, lifetime_secs: i64) -> Claims {
    Claims {
        sub: user.user_name.clone(),
        user_id: user.id.to_string(),
        permission: user.permission().as_str().to_string(),
        token_type: token_type.to_string(),
        exp: now + lifetime_secs,
        iat: now,
    }
}

/// Generate a JWT token pair (access + refresh).
pub fn generate_tokens(
    user: &ApplicationUser,
    jwt_secret: &str,
    access_expiry_secs: i64,
    refresh_expiry_secs: i64,
) -> Result<TokenPair, AppError> {
    let now = Utc::now().timestamp();
    let encoding_key = EncodingKey::from_secret(jwt_secret.as_bytes());

    let encode = |claims: &Claims| {
        jsonwebtoken::encode(&Header::default(), claims, &encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))
    };

    Ok(TokenPair {
        access_token: encode(&claims_for(user, "access", now, access_expiry_secs))?,
        refresh_token: encode(&claims_for(user, "refresh", now, refresh_expiry_secs))?,
        token_type: "Bearer".to_string(),
        expires_in: access_expiry_secs,
    })
}

/// Validate a JWT and return the claims.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    jsonwebtoken::decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
}

async fn find_by_user_name(
    pool: &PgPool,
    user_name: &str,
) -> Result<Option<ApplicationUser>, AppError> {
    let user = sqlx::query_as::<_, ApplicationUser>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM application_users WHERE user_name = $1"
    ))
    .bind(user_name)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Authenticate by username and password, returning a token pair.
pub async fn login(
    pool: &PgPool,
    user_name: &str,
    password: &str,
    jwt_secret: &str,
    access_expiry_secs: i64,
    refresh_expiry_secs: i64,
) -> Result<TokenPair, AppError> {
    let user = find_by_user_name(pool, user_name.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(password, &user.password_hash)? {
        tracing::warn!(user_name = %user.user_name, "Failed login attempt");
        return Err(AppError::Unauthorized);
    }

    tracing::info!(user_id = %user.id, "Login succeeded");
    generate_tokens(&user, jwt_secret, access_expiry_secs, refresh_expiry_secs)
}

/// Self-registration. Every account but the very first is a plain user.
pub async fn register(pool: &PgPool, input: &RegisterAccount) -> Result<ApplicationUser, AppError> {
    account_service::create(
        pool,
        &NewAccount {
            full_name: &input.full_name,
            user_name: &input.user_name,
            password: &input.password,
            permission: Permission::User,
        },
    )
    .await
}

/// Refresh an access token using a valid refresh token.
pub async fn refresh_token(
    pool: &PgPool,
    refresh_token_str: &str,
    jwt_secret: &str,
    access_expiry_secs: i64,
    refresh_expiry_secs: i64,
) -> Result<TokenPair, AppError> {
    let claims = validate_token(refresh_token_str, jwt_secret)?;

    if claims.token_type != "refresh" {
        return Err(AppError::Unauthorized);
    }

    let user_id: Uuid = claims
        .user_id
        .parse()
        .map_err(|_| AppError::Unauthorized)?;

    // A deleted account cannot refresh.
    let user = find_user_by_id(pool, user_id)
        .await
        .map_err(|e| if e.is_not_found() { AppError::Unauthorized } else { e })?;

    generate_tokens(&user, jwt_secret, access_expiry_secs, refresh_expiry_secs)
}

/// Find an account by ID.
pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<ApplicationUser, AppError> {
    sqlx::query_as::<_, ApplicationUser>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM application_users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
}

/// Update the caller's own full name and username.
pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    input: &UpdateProfile,
) -> Result<ApplicationUser, AppError> {
    let user_name = input.user_name.trim();

    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM application_users WHERE user_name = $1 AND id <> $2)",
    )
    .bind(user_name)
    .bind(id)
    .fetch_one(pool)
    .await?;
    if taken {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    sqlx::query_as::<_, ApplicationUser>(&format!(
        "UPDATE application_users SET full_name = $1, user_name = $2 WHERE id = $3 \
         RETURNING {ACCOUNT_COLUMNS}"
    ))
    .bind(input.full_name.trim())
    .bind(user_name)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(username_conflict)?
    .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
}

/// Replace the caller's password after checking the current one.
pub async fn change_password(
    pool: &PgPool,
    id: Uuid,
    input: &ChangePassword,
) -> Result<(), AppError> {
    let user = find_user_by_id(pool, id).await?;

    if !verify_password(&input.current_password, &user.password_hash)? {
        return Err(AppError::Validation(
            "Current password is incorrect".to_string(),
        ));
    }

    let password_hash = hash_password(&input.new_password)?;
    sqlx::query("UPDATE application_users SET password_hash = $1 WHERE id = $2")
        .bind(&password_hash)
        .bind(id)
        .execute(pool)
        .await?;

    tracing::info!(user_id = %id, "Password changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(permission: &str) -> ApplicationUser {
        ApplicationUser {
            id: Uuid::new_v4(),
            full_name: "Test User".to_string(),
            user_name: "testuser".to_string(),
            password_hash: "h".to_string(),
            permission: permission.to_string(),
            date_assigned: Utc::now(),
        }
    }

    #[test]
    fn password_hash_and_verify() {
        let password = "SecurePassword123!";
        let hash = hash_password(password).unwrap();
        assert_ne!(hash, password);
        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("WrongPassword", &hash).unwrap());
    }

    #[test]
    fn token_generation_and_validation() {
        let user = account("admin");
        let secret = "test-secret-key-for-jwt";
        let tokens = generate_tokens(&user, secret, 900, 604800).unwrap();
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 900);

        let claims = validate_token(&tokens.access_token, secret).unwrap();
        assert_eq!(claims.sub, "testuser");
        assert_eq!(claims.user_id, user.id.to_string());
        assert_eq!(claims.permission, "admin");
        assert_eq!(claims.token_type, "access");

        let refresh = validate_token(&tokens.refresh_token, secret).unwrap();
        assert_eq!(refresh.token_type, "refresh");
        assert!(refresh.exp > claims.exp);
    }

    #[test]
    fn unknown_permission_is_issued_as_user() {
        let tokens = generate_tokens(&account("root"), "s", 900, 900).unwrap();
        let claims = validate_token(&tokens.access_token, "s").unwrap();
        assert_eq!(claims.permission, "user");
    }

    #[test]
    fn invalid_token_rejected() {
        assert!(validate_token("invalid.token.here", "secret").is_err());
    }

    #[test]
    fn wrong_secret_rejected() {
        let tokens = generate_tokens(&account("user"), "secret-a", 900, 900).unwrap();
        assert!(validate_token(&tokens.access_token, "secret-b").is_err());
    }

    #[test]
    fn expired_token_rejected() {
        // Well beyond the 60s default leeway.
        let tokens = generate_tokens(&account("user"), "s", -3600, -3600).unwrap();
        assert!(matches!(
            validate_token(&tokens.access_token, "s"),
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://nobody@localhost:1/none")
            .unwrap();
        let tokens = generate_tokens(&account("user"), "s", 900, 900).unwrap();
        let result = refresh_token(&pool, &tokens.access_token, "s", 900, 900).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
