//! 认证提取器
//!
//! 从 `Authorization: Bearer <jwt>` 中取出当前用户，作为显式参数交给控制器

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use crate::error::ServerError;
use crate::http::HttpServerState;
use crate::push::Notifiable;

/// 已认证的调用者
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    /// interest 命名空间，来自 channel.interest_namespace
    pub namespace: String,
}

impl AuthUser {
    pub fn new(user_id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            namespace: namespace.into(),
        }
    }
}

impl Notifiable for AuthUser {
    fn notifiable_type(&self) -> &str {
        &self.namespace
    }

    fn notifiable_key(&self) -> String {
        self.user_id.clone()
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

impl FromRequestParts<HttpServerState> for AuthUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpServerState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ServerError::Unauthorized("缺少 Bearer token".to_string()))?;

        let claims = state.jwt_service.verify_token(token)?;
        debug!("🔐 请求已认证: user_id={}", claims.sub);

        Ok(AuthUser::new(claims.sub, state.interest_namespace.as_str()))
    }
}
