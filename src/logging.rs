use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use anyhow::{Context, Result};

/// 初始化日志系统
///
/// 日志经非阻塞 writer 输出（指定 log_file 时写入文件），返回的 guard 需要在进程结束前一直持有
pub fn init_logging(
    log_level: &str,
    log_format: Option<&str>,
    log_file: Option<&str>,
    quiet: bool,
) -> Result<WorkerGuard> {
    // 如果静默模式，只输出错误
    let level = if quiet {
        "error"
    } else {
        log_level
    };

    // 解析日志级别
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let (writer, guard) = match log_file {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("无效的日志文件路径: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("无法创建日志目录: {}", dir.display()))?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };
    let ansi = log_file.is_none();

    // 根据格式选择不同的输出方式
    match log_format {
        Some("json") => {
            // JSON 格式（适合生产环境）
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(writer))
                .try_init()?;
        }
        Some("pretty") | Some("dev") => {
            // Pretty 格式（适合开发环境）
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_ansi(ansi).with_writer(writer))
                .try_init()?;
        }
        _ => {
            // Compact 格式（默认）
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_ansi(ansi).with_writer(writer))
                .try_init()?;
        }
    }

    Ok(guard)
}
