//! Bearer-token revocation.
//!
//! Token issuance and verification live outside this service. What lives here
//! is the revocation list: a token presented after `POST /api/v1/auth/revoke`
//! is rejected by the middleware on every route it guards.

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use redis::AsyncCommands;
use thiserror::Error;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::state::AppState;

const KEY_PREFIX: &str = "talentmatch:revoked:";

#[derive(Debug, Error)]
pub enum RevocationError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait RevocationList: Send + Sync {
    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError>;
    async fn revoke(&self, token: &str) -> Result<(), RevocationError>;
}

/// Redis-backed list. Entries expire after `ttl`, which should be at least
/// the lifetime of the tokens being revoked.
pub struct RedisRevocationList {
    client: redis::Client,
    ttl: Duration,
}

impl RedisRevocationList {
    pub fn new(client: redis::Client, ttl: Duration) -> Self {
        Self { client, ttl }
    }
}

#[async_trait]
impl RevocationList for RedisRevocationList {
    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let revoked: bool = conn.exists(format!("{KEY_PREFIX}{token}")).await?;
        Ok(revoked)
    }

    async fn revoke(&self, token: &str) -> Result<(), RevocationError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(format!("{KEY_PREFIX}{token}"), 1, self.ttl.as_secs().max(1))
            .await?;
        Ok(())
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Rejects requests whose bearer token has been revoked. Requests without a
/// token pass through. If the list cannot be consulted the request fails
/// with 503 rather than being let in.
pub async fn reject_revoked_tokens(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = bearer_token(req.headers()) {
        if state.revocations.is_revoked(token).await? {
            warn!("Rejected revoked bearer token");
            return Err(AppError::Unauthorized);
        }
    }
    Ok(next.run(req).await)
}

/// POST /api/v1/auth/revoke
///
/// Revokes the bearer token the request was made with.
pub async fn handle_revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    state.revocations.revoke(token).await?;
    info!("Bearer token revoked");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryRevocationList {
        tokens: Mutex<HashSet<String>>,
        unavailable: AtomicBool,
    }

    impl MemoryRevocationList {
        pub fn set_unavailable(&self) {
            self.unavailable.store(true, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), RevocationError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(RevocationError::Redis(redis::RedisError::from((
                    redis::ErrorKind::IoError,
                    "revocation store unavailable",
                ))));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RevocationList for MemoryRevocationList {
        async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
            self.check()?;
            Ok(self.tokens.lock().unwrap().contains(token))
        }

        async fn revoke(&self, token: &str) -> Result<(), RevocationError> {
            self.check()?;
            self.tokens.lock().unwrap().insert(token.to_string());
            Ok(())
        }
    }
}
