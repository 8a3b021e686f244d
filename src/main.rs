use anyhow::{Context, Result};
use expo_push::{
    auth::JwtService,
    cli::{Cli, Commands},
    config::{self, ServerConfig},
    logging, PushServer,
};
use std::fs;
use std::process;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载 .env 文件（如果存在）
    let _ = dotenvy::dotenv();

    // 解析命令行参数
    let cli = Cli::parse();

    // 处理子命令
    if let Some(command) = &cli.command {
        match command {
            Commands::GenerateConfig { path } => {
                return generate_config(path);
            }
            Commands::ValidateConfig { path } => {
                return validate_config(path);
            }
            Commands::ShowConfig => {
                return show_config(&cli);
            }
            Commands::IssueToken { user_id, ttl } => {
                return issue_token(&cli, user_id, *ttl);
            }
        }
    }

    // 快速读取 config.toml 的 [logging] 段（不加载完整配置）
    let early_log = config::load_early_logging_config(cli.config_file.as_deref());

    // 合并日志配置（优先级：CLI > config.toml > 默认值）
    let log_level = cli
        .get_log_level()
        .or(early_log.level)
        .unwrap_or_else(|| "info".to_string());
    let log_format = cli.get_log_format().or(early_log.format);
    let log_file = cli.log_file.clone().or(early_log.file);

    let _log_guard = logging::init_logging(&log_level, log_format.as_deref(), log_file.as_deref(), cli.quiet)?;

    tracing::info!("🚀 Expo Push Server starting...");

    // 加载配置（按优先级：命令行 > 环境变量 > 配置文件 > 默认值）
    let config = ServerConfig::load(&cli).context("加载配置失败")?;

    if cli.dev {
        tracing::info!("🔧 开发模式已启用（Mock 网关）");
    }

    // 显示配置信息
    tracing::info!("📊 Server Configuration:");
    tracing::info!("  - HTTP: {}", config.bind_address());
    tracing::info!("  - Gateway: {:?}", config.expo.gateway);
    tracing::info!("  - Push URL: {}", config.expo.push_url);
    tracing::info!("  - Access Token: {}", config.expo.access_token.is_some());
    tracing::info!("  - Interest Namespace: {}", config.channel.interest_namespace);
    tracing::info!("  - Log Level: {}", config.log_level);
    tracing::info!(
        "  - Log Format: {:?}",
        log_format.as_deref().unwrap_or("compact")
    );
    if let Some(f) = &log_file {
        tracing::info!("  - Log File: {}", f);
    }

    let server = match PushServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("❌ 服务初始化失败: {}", e);
            tracing::error!("💡 请检查 [expo] 配置后重试");
            process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!("❌ 服务运行失败: {}", e);
        process::exit(1);
    }

    Ok(())
}

/// 生成默认配置文件
fn generate_config(path: &str) -> Result<()> {
    let default_config = r#"# Expo Push 配置文件
# 此文件由 expo-push generate-config 生成

[server]
host = "127.0.0.1"
port = 8090

[expo]
# expo: 调用 Expo Push API；mock: 只打印日志
gateway = "expo"
push_url = "https://exp.host/--/api/v2/push/send"
# access_token = ""   # 建议使用 EXPO_PUSH_ACCESS_TOKEN
timeout_secs = 10
# 以 info 级别记录请求体和回执
debug = false

[channel]
interest_namespace = "App.User"

[auth]
# jwt_secret = ""     # 至少 32 字节，建议使用 EXPO_PUSH_JWT_SECRET
issuer = "expo-push"
audience = "expo-push-client"
token_ttl_secs = 3600

[logging]
level = "info"
format = "compact"
# file = "./logs/expo-push.log"
"#;

    fs::write(path, default_config).with_context(|| format!("无法写入配置文件: {}", path))?;

    println!("✅ 配置文件已生成: {}", path);
    Ok(())
}

/// 验证配置文件
fn validate_config(path: &str) -> Result<()> {
    let config = ServerConfig::from_toml_file(path)
        .with_context(|| format!("配置文件验证失败: {}", path))?;
    config
        .validate()
        .with_context(|| format!("配置文件验证失败: {}", path))?;

    println!("✅ 配置文件有效: {}", path);
    println!("📊 配置摘要:");
    println!("  - HTTP: {}", config.bind_address());
    println!("  - Gateway: {:?}", config.expo.gateway);
    println!("  - Interest Namespace: {}", config.channel.interest_namespace);

    Ok(())
}

/// 显示最终配置（合并后的配置）
fn show_config(cli: &Cli) -> Result<()> {
    let _log_guard = logging::init_logging("info", None, None, false)?;

    let mut config = ServerConfig::load(cli).context("加载配置失败")?;
    if config.expo.access_token.is_some() {
        config.expo.access_token = Some("******".to_string());
    }
    config.auth.jwt_secret = "******".to_string();

    println!("📊 最终配置（合并后的配置）:");
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

/// 签发测试用 JWT
fn issue_token(cli: &Cli, user_id: &str, ttl: Option<i64>) -> Result<()> {
    let config = ServerConfig::load(cli).context("加载配置失败")?;
    let jwt_service = JwtService::from_config(&config.auth);
    let token = jwt_service.issue_token(user_id, ttl)?;

    println!("{}", token);
    Ok(())
}
