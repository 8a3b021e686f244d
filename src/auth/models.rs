use serde::{Deserialize, Serialize};

/// 客户端 JWT Token Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// JWT 标准字段 - 签发者
    pub iss: String,
    /// JWT 标准字段 - 主题 (用户唯一键)
    pub sub: String,
    /// JWT 标准字段 - 受众
    pub aud: String,
    /// JWT 标准字段 - 过期时间 (Unix timestamp)
    pub exp: i64,
    /// JWT 标准字段 - 签发时间
    pub iat: i64,
    /// JWT 标准字段 - JWT ID
    pub jti: String,
}
