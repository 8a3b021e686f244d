// 认证模块 - 提供JWT签发和验证

pub mod jwt_service;
pub mod models;

// 重新导出主要类型
pub use jwt_service::JwtService;
pub use models::TokenClaims;
