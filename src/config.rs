use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use serde::{Deserialize, Serialize};
use anyhow::{Result, Context};
use crate::push::gateway::EXPO_PUSH_URL;

/// 环境变量前缀
const ENV_PREFIX: &str = "EXPO_PUSH_";

/// 默认的占位 JWT 密钥，真实网关下禁止使用
const PLACEHOLDER_JWT_SECRET: &str = "your_jwt_secret_here";

/// 真实网关下 JWT 密钥的最小字节数
const MIN_JWT_SECRET_LEN: usize = 32;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 服务器监听地址
    pub host: String,
    /// HTTP 端口
    pub port: u16,
    /// 日志级别
    pub log_level: String,
    /// Expo 网关配置
    pub expo: ExpoConfig,
    /// 推送渠道配置
    pub channel: ChannelConfig,
    /// 认证配置
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8090,
            log_level: "info".to_string(),
            expo: ExpoConfig::default(),
            channel: ChannelConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

/// 网关类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// 调用 Expo Push API
    Expo,
    /// 只打印日志，不发网络请求
    Mock,
}

impl GatewayKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "expo" => Some(GatewayKind::Expo),
            "mock" => Some(GatewayKind::Mock),
            _ => None,
        }
    }
}

/// Expo 网关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpoConfig {
    /// 网关类型
    pub gateway: GatewayKind,
    /// 推送接口地址
    pub push_url: String,
    /// Expo 访问令牌（敏感，建议用环境变量覆盖）
    pub access_token: Option<String>,
    /// 请求超时（秒）
    pub timeout_secs: u64,
    /// 以 info 级别记录请求体和回执
    #[serde(default)]
    pub debug: bool,
}

impl Default for ExpoConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayKind::Expo,
            push_url: EXPO_PUSH_URL.to_string(),
            access_token: None,
            timeout_secs: 10,
            debug: false,
        }
    }
}

impl ExpoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 推送渠道配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// 已认证用户的 interest 命名空间，interest = `{namespace}.{user_id}`
    pub interest_namespace: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            interest_namespace: "App.User".to_string(),
        }
    }
}

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT 密钥
    pub jwt_secret: String,
    /// 签发者
    pub issuer: String,
    /// 受众
    pub audience: String,
    /// 令牌有效期（秒），仅用于 issue-token 子命令
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: PLACEHOLDER_JWT_SECRET.to_string(),
            issuer: "expo-push".to_string(),
            audience: "expo-push-client".to_string(),
            token_ttl_secs: 3600,
        }
    }
}

impl ServerConfig {
    /// 创建新的服务器配置
    pub fn new() -> Self {
        Self::default()
    }

    /// HTTP 监听地址
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 从 TOML 文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("无法读取配置文件: {:?}", path.as_ref()))?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let toml_config: TomlConfig = toml::from_str(content)
            .with_context(|| "配置文件格式错误")?;

        toml_config.try_into()
    }

    /// 从环境变量加载配置（EXPO_PUSH_ 前缀）
    pub fn merge_from_env(&mut self) -> Result<()> {
        self.merge_from_vars(|key| env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    fn merge_from_vars<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("HOST") {
            self.host = host;
        }
        if let Some(port) = var("PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("无效的端口: {}", port))?;
        }
        if let Some(log_level) = var("LOG_LEVEL") {
            self.log_level = log_level;
        }

        // Expo 配置
        if let Some(gateway) = var("GATEWAY") {
            self.expo.gateway = GatewayKind::from_str(&gateway)
                .with_context(|| format!("未知的网关类型: {}", gateway))?;
        }
        if let Some(push_url) = var("URL") {
            self.expo.push_url = push_url;
        }
        if let Some(access_token) = var("ACCESS_TOKEN") {
            self.expo.access_token = Some(access_token);
        }
        if let Some(timeout) = var("TIMEOUT_SECS") {
            self.expo.timeout_secs = timeout
                .parse()
                .with_context(|| format!("无效的超时时间: {}", timeout))?;
        }
        if let Some(debug) = var("DEBUG") {
            self.expo.debug = debug
                .parse()
                .with_context(|| format!("无效的 debug 开关: {}", debug))?;
        }

        if let Some(namespace) = var("INTEREST_NAMESPACE") {
            self.channel.interest_namespace = namespace;
        }

        // 认证配置
        if let Some(jwt_secret) = var("JWT_SECRET") {
            self.auth.jwt_secret = jwt_secret;
        }
        if let Some(issuer) = var("JWT_ISSUER") {
            self.auth.issuer = issuer;
        }
        if let Some(audience) = var("JWT_AUDIENCE") {
            self.auth.audience = audience;
        }

        Ok(())
    }

    /// 从命令行参数合并配置
    pub fn merge_from_cli(&mut self, cli: &crate::cli::Cli) {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(gateway) = cli.gateway {
            self.expo.gateway = gateway;
        }
        if let Some(access_token) = &cli.access_token {
            self.expo.access_token = Some(access_token.clone());
        }
        if let Some(jwt_secret) = &cli.jwt_secret {
            self.auth.jwt_secret = jwt_secret.clone();
        }
        if let Some(log_level) = cli.get_log_level() {
            self.log_level = log_level;
        }
        if cli.dev {
            self.expo.gateway = GatewayKind::Mock;
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<()> {
        if self.channel.interest_namespace.trim().is_empty() {
            anyhow::bail!("channel.interest_namespace 不能为空");
        }
        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("auth.jwt_secret 不能为空");
        }
        // mock 网关只用于本地开发，允许占位密钥
        if self.expo.gateway == GatewayKind::Expo {
            if self.auth.jwt_secret == PLACEHOLDER_JWT_SECRET {
                anyhow::bail!("auth.jwt_secret 仍是默认占位值，请通过 EXPO_PUSH_JWT_SECRET 设置");
            }
            if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
                anyhow::bail!("auth.jwt_secret 至少需要 {} 字节", MIN_JWT_SECRET_LEN);
            }
        }
        if self.expo.gateway == GatewayKind::Expo && !self.expo.push_url.starts_with("http") {
            anyhow::bail!("expo.push_url 必须是 http(s) 地址: {}", self.expo.push_url);
        }
        Ok(())
    }

    /// 加载配置（按优先级：命令行 > 环境变量 > 配置文件 > 默认值）
    pub fn load(cli: &crate::cli::Cli) -> Result<Self> {
        // 1. 从配置文件加载（如果指定）
        let mut config = if let Some(config_file) = &cli.config_file {
            if Path::new(config_file).exists() {
                info!("📄 从配置文件加载: {}", config_file);
                Self::from_toml_file(config_file)?
            } else {
                tracing::warn!("⚠️ 配置文件不存在: {}", config_file);
                Self::new()
            }
        } else if Path::new("config.toml").exists() {
            info!("📄 从默认配置文件加载: config.toml");
            Self::from_toml_file("config.toml")?
        } else {
            Self::new()
        };

        // 2. 从环境变量合并（优先级高于配置文件）
        config.merge_from_env()?;

        // 3. 从命令行参数合并（最高优先级）
        config.merge_from_cli(cli);

        config.validate()?;
        Ok(config)
    }
}

/// 日志配置（在完整配置之前读取，用于尽早初始化日志）
#[derive(Debug, Default, Deserialize)]
pub struct EarlyLoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
    pub file: Option<String>,
}

/// 快速读取配置文件中的 [logging] 段，读取失败时返回空配置
pub fn load_early_logging_config(config_file: Option<&str>) -> EarlyLoggingConfig {
    let path = config_file.unwrap_or("config.toml");
    fs::read_to_string(path)
        .ok()
        .and_then(|content| toml::from_str::<TomlConfig>(&content).ok())
        .and_then(|config| config.logging)
        .map(|logging| EarlyLoggingConfig {
            level: logging.level,
            format: logging.format,
            file: logging.file,
        })
        .unwrap_or_default()
}

/// TOML 配置文件结构（用于反序列化）
#[derive(Debug, Deserialize)]
struct TomlConfig {
    server: Option<TomlServerConfig>,
    expo: Option<TomlExpoConfig>,
    channel: Option<TomlChannelConfig>,
    auth: Option<TomlAuthConfig>,
    logging: Option<TomlLoggingConfig>,
}

#[derive(Debug, Deserialize)]
struct TomlServerConfig {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct TomlExpoConfig {
    gateway: Option<String>,
    push_url: Option<String>,
    access_token: Option<String>,
    timeout_secs: Option<u64>,
    debug: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct TomlChannelConfig {
    interest_namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlAuthConfig {
    jwt_secret: Option<String>,
    issuer: Option<String>,
    audience: Option<String>,
    token_ttl_secs: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TomlLoggingConfig {
    level: Option<String>,
    format: Option<String>,
    file: Option<String>,
}

impl TryFrom<TomlConfig> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(toml: TomlConfig) -> Result<Self> {
        let mut config = Self::default();

        if let Some(server) = toml.server {
            if let Some(host) = server.host {
                config.host = host;
            }
            if let Some(port) = server.port {
                config.port = port;
            }
        }

        if let Some(expo) = toml.expo {
            if let Some(gateway) = expo.gateway {
                config.expo.gateway = GatewayKind::from_str(&gateway)
                    .with_context(|| format!("未知的网关类型: {}", gateway))?;
            }
            if let Some(push_url) = expo.push_url {
                config.expo.push_url = push_url;
            }
            if expo.access_token.is_some() {
                config.expo.access_token = expo.access_token;
            }
            if let Some(timeout) = expo.timeout_secs {
                config.expo.timeout_secs = timeout;
            }
            if let Some(debug) = expo.debug {
                config.expo.debug = debug;
            }
        }

        if let Some(channel) = toml.channel {
            if let Some(namespace) = channel.interest_namespace {
                config.channel.interest_namespace = namespace;
            }
        }

        if let Some(auth) = toml.auth {
            if let Some(secret) = auth.jwt_secret {
                config.auth.jwt_secret = secret;
            }
            if let Some(issuer) = auth.issuer {
                config.auth.issuer = issuer;
            }
            if let Some(audience) = auth.audience {
                config.auth.audience = audience;
            }
            if let Some(ttl) = auth.token_ttl_secs {
                config.auth.token_ttl_secs = ttl;
            }
        }

        if let Some(logging) = toml.logging {
            if let Some(level) = logging.level {
                config.log_level = level;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_toml_overrides_defaults() {
        let config = ServerConfig::from_toml_str(
            r#"
[server]
port = 9100

[expo]
gateway = "mock"
timeout_secs = 3
debug = true

[channel]
interest_namespace = "Acme.Member"

[logging]
level = "debug"
"#,
        )
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.expo.gateway, GatewayKind::Mock);
        assert_eq!(config.expo.timeout(), Duration::from_secs(3));
        assert_eq!(config.expo.push_url, EXPO_PUSH_URL);
        assert!(config.expo.debug);
        assert_eq!(config.channel.interest_namespace, "Acme.Member");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_unknown_gateway_is_rejected() {
        let result = ServerConfig::from_toml_str("[expo]\ngateway = \"pusher\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_env_vars_take_precedence() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "9200"),
            ("GATEWAY", "mock"),
            ("ACCESS_TOKEN", "secret"),
            ("JWT_SECRET", "from-env"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::new();
        config
            .merge_from_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.port, 9200);
        assert_eq!(config.expo.gateway, GatewayKind::Mock);
        assert_eq!(config.expo.access_token.as_deref(), Some("secret"));
        assert_eq!(config.auth.jwt_secret, "from-env");
    }

    #[test]
    fn test_validate_rejects_empty_namespace() {
        let mut config = ServerConfig::new();
        config.channel.interest_namespace = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_env_numbers_are_errors() {
        let mut config = ServerConfig::new();
        let result = config.merge_from_vars(|key| (key == "TIMEOUT_SECS").then(|| "ten".to_string()));
        assert!(result.is_err());
        assert_eq!(config.expo.timeout_secs, 10);

        let result = config.merge_from_vars(|key| (key == "PORT").then(|| "http".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_weak_jwt_secret_for_expo_gateway() {
        let mut config = ServerConfig::new();
        assert_eq!(config.expo.gateway, GatewayKind::Expo);
        assert!(config.validate().is_err());

        config.auth.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());

        config.auth.jwt_secret = "0123456789abcdef0123456789abcdef".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mock_gateway_allows_placeholder_secret() {
        let mut config = ServerConfig::new();
        config.expo.gateway = GatewayKind::Mock;
        assert!(config.validate().is_ok());
    }
}
