//! 계정/세션 처리
//! 1. Argon2 비밀번호 해시
//! 2. 불투명 세션 토큰 발급/폐기
//! 3. 요청 인증 추출기 (Bearer 또는 세션 쿠키)

// region:    --- Imports
use crate::database::DatabaseManager;
use crate::errors::ApiError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

/// 세션 쿠키 이름
pub const SESSION_COOKIE: &str = "session";

// 세션 토큰 길이 (영숫자, 256비트 상당)
const SESSION_TOKEN_LEN: usize = 43;

// region:    --- Account Model

/// 사용자 모델
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    // 해시는 JSON 으로 내보내지 않음
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// 세션에서 복원한 인증 사용자
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

// endregion: --- Account Model

// region:    --- Password Hashing

/// Argon2id 해시 생성
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Database(sqlx::Error::Protocol(e.to_string())))
}

/// 비밀번호 검증, 형식이 깨진 해시는 불일치로 처리
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

// endregion: --- Password Hashing

// region:    --- Sessions

/// 세션 토큰 생성
fn generate_session_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// 세션 발급
pub async fn create_session(db: &DatabaseManager, user_id: i64) -> Result<String, sqlx::Error> {
    let token = generate_session_token();
    sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
        .bind(&token)
        .bind(user_id)
        .execute(&*db.get_pool())
        .await?;
    info!("{:<12} --> 세션 발급 user: {}", "Accounts", user_id);
    Ok(token)
}

/// 세션 토큰으로 사용자 조회
pub async fn find_session_user(
    db: &DatabaseManager,
    token: &str,
) -> Result<Option<AuthUser>, sqlx::Error> {
    sqlx::query_as::<_, AuthUser>(
        "SELECT u.id, u.username FROM sessions s JOIN users u ON u.id = s.user_id WHERE s.token = $1",
    )
    .bind(token)
    .fetch_optional(&*db.get_pool())
    .await
}

/// 세션 폐기
pub async fn revoke_session(db: &DatabaseManager, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(&*db.get_pool())
        .await?;
    info!("{:<12} --> 세션 폐기", "Accounts");
    Ok(())
}

// endregion: --- Sessions

// region:    --- User Store

/// 사용자명으로 사용자 조회 (해시 포함, 로그인 검증용)
pub async fn find_user_by_username(
    db: &DatabaseManager,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(&*db.get_pool())
    .await
}

/// 사용자 등록
pub async fn insert_user(
    db: &DatabaseManager,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(&*db.get_pool())
    .await
}

/// 고유 제약 위반 여부 (사용자명 중복 판별)
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

// endregion: --- User Store

// region:    --- Auth Extractor

/// 요청 인증 정보
/// Bearer 토큰을 우선 확인하고 없으면 세션 쿠키를 확인
/// 토큰이 없거나 세션이 만료된 요청은 Unauthorized 로 통과시킴
#[derive(Debug, Clone)]
pub enum Auth {
    Authorized(String, AuthUser),
    Unauthorized,
}

impl Auth {
    /// 로그인 사용자 반환, 미로그인이면 UNAUTHENTICATED
    pub fn require(&self) -> Result<&AuthUser, ApiError> {
        match self {
            Auth::Authorized(_, user) => Ok(user),
            Auth::Unauthorized => Err(ApiError::Unauthenticated),
        }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Auth::Authorized(_, user) => Some(user),
            Auth::Unauthorized => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Auth::Authorized(token, _) => Some(token),
            Auth::Unauthorized => None,
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<DatabaseManager>> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<DatabaseManager>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await {
                Ok(TypedHeader(Authorization(bearer))) => Some(bearer.token().to_string()),
                Err(_) => CookieJar::from_request_parts(parts, state)
                    .await
                    .ok()
                    .and_then(|jar| jar.get(SESSION_COOKIE).map(|c| c.value().to_string())),
            };

        let Some(token) = token else {
            return Ok(Auth::Unauthorized);
        };

        match find_session_user(state, &token).await? {
            Some(user) => Ok(Auth::Authorized(token, user)),
            None => Ok(Auth::Unauthorized),
        }
    }
}

// endregion: --- Auth Extractor
