use crate::auth::models::TokenClaims;
use crate::config::AuthConfig;
use crate::error::{Result, ServerError};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

/// JWT 签发和验证服务
///
/// 令牌由宿主应用签发，这里只负责校验并取出用户唯一键（`sub`）
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    token_ttl: i64,
}

impl JwtService {
    /// 创建 JWT 服务 (HS256 对称加密)
    pub fn new(secret: &str, issuer: String, audience: String, token_ttl: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            token_ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            config.issuer.clone(),
            config.audience.clone(),
            config.token_ttl_secs,
        )
    }

    /// 签发 token
    pub fn issue_token(&self, subject: &str, custom_ttl: Option<i64>) -> Result<String> {
        let now = Utc::now().timestamp();
        let ttl = custom_ttl.unwrap_or(self.token_ttl);

        let claims = TokenClaims {
            iss: self.issuer.clone(),
            sub: subject.to_string(),
            aud: self.audience.clone(),
            exp: now + ttl,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| ServerError::Internal(format!("JWT 签发失败: {}", e)))
    }

    /// 验证 token
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|_e| ServerError::InvalidToken)?;

        Ok(token_data.claims)
    }
}
