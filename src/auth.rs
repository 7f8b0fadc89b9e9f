//! Minimal user-auth backend: signup and signin over an in-memory store,
//! argon2 password hashing, short-lived HS256 JWTs. Kept separate from the
//! AI routes and uses its own `{"error": ...}` body shape.

use std::collections::HashMap;
use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use parking_lot::RwLock;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

const TOKEN_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

/// Auth service shared across handlers: user store plus the JWT signing
/// secret.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
    secret: Arc<String>,
}

impl AuthService {
    pub fn new(secret: String) -> Self {
        Self {
            users: Arc::default(),
            secret: Arc::new(secret),
        }
    }

    pub fn from_env() -> Self {
        let secret = std::env::var("AUTH_SECRET_KEY")
            .unwrap_or_else(|_| "change_this_secret_in_production".to_string());
        Self::new(secret)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
struct Claims {
    username: String,
    exp: i64,
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub async fn signup(
    State(auth): State<AuthService>,
    Json(body): Json<CredentialsRequest>,
) -> impl IntoResponse {
    let (username, password) = match (body.username, body.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Username and password required."})),
            );
        }
    };

    if auth.users.read().contains_key(&username) {
        warn!("signup rejected, username already exists: {}", username);
        return (
            StatusCode::CONFLICT,
            Json(json!({"error": "Username already exists."})),
        );
    }

    let password_hash = match hash_password(&password) {
        Ok(h) => h,
        Err(e) => {
            warn!("password hashing failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error."})),
            );
        }
    };

    let record = UserRecord {
        id: Uuid::new_v4(),
        username: username.clone(),
        password_hash,
    };
    info!("✅ Registered user {} with id {}", record.username, record.id);
    auth.users.write().insert(username, record);

    (
        StatusCode::CREATED,
        Json(json!({"message": "User registered successfully."})),
    )
}

pub async fn signin(
    State(auth): State<AuthService>,
    Json(body): Json<CredentialsRequest>,
) -> impl IntoResponse {
    let (username, password) = match (body.username, body.password) {
        (Some(u), Some(p)) => (u, p),
        _ => (String::new(), String::new()),
    };

    let stored_hash = auth
        .users
        .read()
        .get(&username)
        .map(|u| u.password_hash.clone());

    let valid = stored_hash
        .as_deref()
        .map(|hash| verify_password(&password, hash))
        .unwrap_or(false);

    if !valid {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid credentials."})),
        );
    }

    let claims = Claims {
        username: username.clone(),
        exp: (Utc::now() + Duration::minutes(TOKEN_TTL_MINUTES)).timestamp(),
    };

    match encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret.as_bytes()),
    ) {
        Ok(token) => {
            info!("✅ Signin successful for {}", username);
            (
                StatusCode::OK,
                Json(json!({"token": token, "message": "Signin successful."})),
            )
        }
        Err(e) => {
            warn!("token encoding failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error."})),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
