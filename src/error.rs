use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use serde::{Serialize, Deserialize};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response, Json},
};

/// 服务器错误类型
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerError {
    /// 内部错误
    Internal(String),
    /// 验证错误（按字段）
    Validation(ValidationErrors),
    /// 推送网关错误
    Gateway(String),
    /// 网络错误
    Network(String),
    /// 序列化错误
    Serialization(String),
    /// 配置错误
    Configuration(String),
    /// 超时错误
    Timeout(String),
    /// 无效令牌
    InvalidToken,
    /// 未授权
    Unauthorized(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ServerError::Validation(errors) => write!(f, "Validation error: {}", errors),
            ServerError::Gateway(msg) => write!(f, "Gateway error: {}", msg),
            ServerError::Network(msg) => write!(f, "Network error: {}", msg),
            ServerError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ServerError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ServerError::Timeout(msg) => write!(f, "Timeout error: {}", msg),
            ServerError::InvalidToken => write!(f, "Invalid token"),
            ServerError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
        }
    }
}

impl StdError for ServerError {}

impl ServerError {
    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidToken | ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Gateway(_) | ServerError::Network(_) => StatusCode::BAD_GATEWAY,
            ServerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::new(&self);
        (status_code, Json(error_response)).into_response()
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::Serialization(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for ServerError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        ServerError::Timeout(err.to_string())
    }
}

impl From<reqwest::Error> for ServerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServerError::Timeout(err.to_string())
        } else if err.is_decode() {
            ServerError::Serialization(err.to_string())
        } else {
            ServerError::Network(err.to_string())
        }
    }
}

impl From<ValidationErrors> for ServerError {
    fn from(errors: ValidationErrors) -> Self {
        ServerError::Validation(errors)
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ServerError>;

/// 字段级验证错误，序列化为 `{"field": ["message", ...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为字段追加一条错误消息
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for messages in self.0.values() {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}", message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// 错误代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// 成功
    Success = 0,
    /// 内部错误
    Internal = 1000,
    /// 验证错误
    Validation = 1003,
    /// 网络错误
    Network = 2001,
    /// 序列化错误
    Serialization = 2002,
    /// 配置错误
    Configuration = 2003,
    /// 超时错误
    Timeout = 3002,
    /// 推送网关错误
    Gateway = 3003,
    /// 未授权
    Unauthorized = 1001,
    /// 无效令牌
    InvalidToken = 5002,
}

impl From<&ServerError> for ErrorCode {
    fn from(error: &ServerError) -> Self {
        match error {
            ServerError::Internal(_) => ErrorCode::Internal,
            ServerError::Validation(_) => ErrorCode::Validation,
            ServerError::Gateway(_) => ErrorCode::Gateway,
            ServerError::Network(_) => ErrorCode::Network,
            ServerError::Serialization(_) => ErrorCode::Serialization,
            ServerError::Configuration(_) => ErrorCode::Configuration,
            ServerError::Timeout(_) => ErrorCode::Timeout,
            ServerError::InvalidToken => ErrorCode::InvalidToken,
            ServerError::Unauthorized(_) => ErrorCode::Unauthorized,
        }
    }
}

/// 错误响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: ErrorCode,
    /// 错误消息
    pub message: String,
    /// 详细信息
    pub details: Option<String>,
    /// 时间戳
    pub timestamp: u64,
}

impl ErrorResponse {
    /// 创建错误响应
    pub fn new(error: &ServerError) -> Self {
        Self {
            code: ErrorCode::from(error),
            message: error.to_string(),
            details: None,
            timestamp: chrono::Utc::now().timestamp() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_serialize_by_field() {
        let mut errors = ValidationErrors::new();
        errors.add("expo_token", "The expo token field is required.");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["expo_token"][0], "The expo token field is required.");
        assert_eq!(
            ServerError::from(errors).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
