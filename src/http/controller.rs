//! 设备订阅控制器
//!
//! 每个请求只做一次：校验 → 调用渠道 → 返回 JSON。网关错误在这里被吞掉并转成失败响应

use std::sync::Arc;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{ServerError, ValidationErrors};
use crate::push::{ExpoChannel, Notifiable, PushToken};

/// 请求体中的令牌字段
pub const TOKEN_FIELD: &str = "expo_token";

/// 带状态码的 JSON 响应
#[derive(Debug, Clone)]
pub struct JsonResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl JsonResponse {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    fn failed(error: &ServerError) -> Self {
        let status = match error {
            ServerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = match error {
            ServerError::Validation(errors) => json!({ "status": "failed", "errors": errors }),
            ServerError::Gateway(message) => json!({ "status": "failed", "message": message }),
            other => json!({ "status": "failed", "message": other.to_string() }),
        };
        Self { status, body }
    }
}

impl IntoResponse for JsonResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// 校验订阅请求，返回合法的令牌
pub fn validate_subscription(input: &Value) -> Result<PushToken, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    match input.get(TOKEN_FIELD) {
        None | Some(Value::Null) => errors.add(TOKEN_FIELD, "The expo token field is required."),
        Some(Value::String(raw)) if raw.trim().is_empty() => {
            errors.add(TOKEN_FIELD, "The expo token field is required.")
        }
        Some(Value::String(raw)) => match PushToken::parse(raw) {
            Some(token) => return Ok(token),
            None => errors.add(TOKEN_FIELD, "The expo token format is invalid."),
        },
        Some(_) => errors.add(TOKEN_FIELD, "The expo token must be a string."),
    }

    Err(errors)
}

/// Expo 设备订阅控制器
pub struct ExpoController {
    channel: Arc<ExpoChannel>,
}

impl ExpoController {
    pub fn new(channel: Arc<ExpoChannel>) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &Arc<ExpoChannel> {
        &self.channel
    }

    /// 订阅：校验令牌并注册到调用者的 interest
    pub async fn subscribe(&self, principal: &dyn Notifiable, input: &Value) -> JsonResponse {
        let token = match validate_subscription(input) {
            Ok(token) => token,
            Err(errors) => {
                warn!(
                    "📵 订阅参数无效: user={}, errors={}",
                    principal.notifiable_key(),
                    errors
                );
                return JsonResponse::failed(&ServerError::Validation(errors));
            }
        };

        match self.channel.subscribe(principal, &token).await {
            Ok(interest) => {
                info!("📲 设备已订阅: interest={}", interest);
                JsonResponse::new(
                    StatusCode::OK,
                    json!({ "status": "succeeded", "expo_token": token.as_str() }),
                )
            }
            Err(e) => {
                warn!("❌ 订阅失败: user={}, error={}", principal.notifiable_key(), e);
                JsonResponse::failed(&e)
            }
        }
    }

    /// 取消订阅
    ///
    /// 请求体带合法的 expo_token 时只移除该设备，否则移除调用者的整个 interest
    pub async fn unsubscribe(&self, principal: &dyn Notifiable, input: Option<&Value>) -> JsonResponse {
        let token = input
            .and_then(|body| body.get(TOKEN_FIELD))
            .and_then(Value::as_str)
            .and_then(PushToken::parse);

        match self.channel.unsubscribe(principal, token.as_ref()).await {
            Ok(interest) => {
                info!("📴 设备已取消订阅: interest={}, single_device={}", interest, token.is_some());
                JsonResponse::new(StatusCode::OK, json!({ "deleted": true }))
            }
            Err(e) => {
                warn!("❌ 取消订阅失败: user={}, error={}", principal.notifiable_key(), e);
                JsonResponse::failed(&e)
            }
        }
    }
}
