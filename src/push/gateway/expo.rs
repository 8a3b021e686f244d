use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use crate::error::{Result, ServerError};
use crate::push::gateway::gateway_trait::PushGateway;
use crate::push::registry::InterestRegistry;
use crate::push::types::{ExpoMessage, GatewayResponse, Interest, PushTicket, PushToken};

/// Expo Push API 默认地址
pub const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

/// 单次请求最多携带的接收者数量（Expo 限制）
const MAX_RECIPIENTS_PER_REQUEST: usize = 100;

/// Expo 返回体
#[derive(Debug, Deserialize)]
struct ExpoPushResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<ExpoApiError>>,
}

#[derive(Debug, Deserialize)]
struct ExpoApiError {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Expo Push Gateway
///
/// interest 与设备令牌的绑定保存在进程内，推送时展开为令牌列表后调用 Expo HTTP API
pub struct ExpoGateway {
    client: Client,
    push_url: String,
    access_token: Option<String>,
    registry: Arc<InterestRegistry>,
    debug: bool,
}

impl ExpoGateway {
    /// 创建新的 Expo Gateway
    ///
    /// # 参数
    /// - push_url: 推送接口地址，默认为 [`EXPO_PUSH_URL`]
    /// - access_token: Expo 访问令牌（开启 Enhanced Security 时必填）
    /// - timeout: 单次请求超时
    pub fn new(push_url: String, access_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::Configuration(format!("Failed to build Expo HTTP client: {}", e)))?;

        Ok(Self {
            client,
            push_url,
            access_token,
            registry: Arc::new(InterestRegistry::new()),
            debug: false,
        })
    }

    /// 开启后以 info 级别记录发往 Expo 的请求体和回执
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn registry(&self) -> Arc<InterestRegistry> {
        Arc::clone(&self.registry)
    }

    fn build_expo_payload(&self, recipients: &[PushToken], message: &ExpoMessage) -> Value {
        let mut payload = message.to_payload();
        if let Value::Object(map) = &mut payload {
            let to = recipients
                .iter()
                .map(|t| Value::String(t.as_str().to_string()))
                .collect();
            map.insert("to".to_string(), Value::Array(to));
        }
        payload
    }

    async fn send_chunk(&self, recipients: &[PushToken], message: &ExpoMessage) -> Result<Vec<PushTicket>> {
        let payload = self.build_expo_payload(recipients, message);
        if self.debug {
            info!("[EXPO] Request payload: {}", payload);
        }

        let mut request = self
            .client
            .post(&self.push_url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");
        if let Some(token) = &self.access_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.json(&payload).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            error!("[EXPO] Push failed: status={}, error={}", status, text);
            let detail = serde_json::from_str::<ExpoPushResponse>(&text)
                .ok()
                .and_then(|r| r.errors)
                .and_then(|errors| errors.into_iter().next())
                .map(|e| match e.code {
                    Some(code) => format!("{} ({})", e.message, code),
                    None => e.message,
                })
                .unwrap_or(text);
            return Err(ServerError::Gateway(format!(
                "Expo push failed: status={}, error={}",
                status, detail
            )));
        }

        let body: ExpoPushResponse = serde_json::from_str(&text)?;
        if let Some(errors) = body.errors {
            if let Some(first) = errors.into_iter().next() {
                return Err(ServerError::Gateway(format!("Expo error: {}", first.message)));
            }
        }

        // 单个接收者时 data 是对象，多个时是数组
        let tickets = match body.data {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<std::result::Result<Vec<PushTicket>, _>>()?,
            Some(item @ Value::Object(_)) => vec![serde_json::from_value(item)?],
            _ => Vec::new(),
        };
        if self.debug {
            info!("[EXPO] Tickets: {}", serde_json::to_string(&tickets)?);
        }

        Ok(tickets)
    }

    /// 清理 Expo 报告为未注册的设备
    fn prune_unregistered(&self, recipients: &[PushToken], tickets: &[PushTicket]) {
        for (token, ticket) in recipients.iter().zip(tickets) {
            if ticket.error_code() == Some("DeviceNotRegistered") {
                warn!("[EXPO] Device not registered, dropping token: {}", token);
                self.registry.forget_token(token);
            }
        }
    }
}

#[async_trait]
impl PushGateway for ExpoGateway {
    async fn subscribe(&self, interest: &Interest, token: &PushToken) -> Result<()> {
        self.registry.subscribe(interest, token);
        info!("[EXPO] Subscribed: interest={}, token={}", interest, token);
        Ok(())
    }

    async fn unsubscribe(&self, interest: &Interest, token: Option<&PushToken>) -> Result<()> {
        let changed = self.registry.unsubscribe(interest, token);
        info!("[EXPO] Unsubscribed: interest={}, changed={}", interest, changed);
        Ok(())
    }

    async fn notify(&self, interests: &[Interest], message: &ExpoMessage) -> Result<GatewayResponse> {
        let recipients = self.registry.recipients(interests);
        if recipients.is_empty() {
            let names: Vec<&str> = interests.iter().map(Interest::as_str).collect();
            return Err(ServerError::Gateway(format!(
                "No recipients for interests: {}",
                names.join(", ")
            )));
        }

        info!(
            "[EXPO] Sending push: interests={}, recipients={}",
            interests.len(),
            recipients.len()
        );

        let mut response = GatewayResponse::default();
        let mut delivered_chunks = 0;
        let mut last_error = None;
        for chunk in recipients.chunks(MAX_RECIPIENTS_PER_REQUEST) {
            match self.send_chunk(chunk, message).await {
                Ok(tickets) => {
                    self.prune_unregistered(chunk, &tickets);
                    response.tickets.extend(tickets);
                    delivered_chunks += 1;
                }
                Err(e) => {
                    // 已发出的分块不回滚，失败分块的每个接收者记一张错误回执
                    error!("[EXPO] Chunk failed: recipients={}, error={}", chunk.len(), e);
                    let reason = e.to_string();
                    response
                        .tickets
                        .extend(chunk.iter().map(|_| PushTicket::error(reason.clone())));
                    last_error = Some(e);
                }
            }
        }

        if delivered_chunks == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        debug!(
            "[EXPO] Push finished: tickets={}, failed={}",
            response.tickets.len(),
            response.failed_count()
        );
        Ok(response)
    }

    fn name(&self) -> &'static str {
        "expo"
    }
}
