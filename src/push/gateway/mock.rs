use std::sync::Arc;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;
use uuid::Uuid;
use crate::error::{Result, ServerError};
use crate::push::gateway::gateway_trait::PushGateway;
use crate::push::registry::InterestRegistry;
use crate::push::types::{ExpoMessage, GatewayResponse, Interest, PushTicket, PushToken};

/// 一次推送记录
#[derive(Debug, Clone)]
pub struct SentPush {
    pub interests: Vec<Interest>,
    pub recipients: Vec<PushToken>,
    pub message: ExpoMessage,
}

/// Mock Gateway（用于测试和本地开发）
///
/// 不调用真实 API，只打印日志并记录推送
#[derive(Default)]
pub struct MockGateway {
    registry: Arc<InterestRegistry>,
    sent: Mutex<Vec<SentPush>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> Arc<InterestRegistry> {
        Arc::clone(&self.registry)
    }

    /// 已记录的推送
    pub fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl PushGateway for MockGateway {
    async fn subscribe(&self, interest: &Interest, token: &PushToken) -> Result<()> {
        info!("[MOCK GATEWAY] subscribe: interest={}, token={}", interest, token);
        self.registry.subscribe(interest, token);
        Ok(())
    }

    async fn unsubscribe(&self, interest: &Interest, token: Option<&PushToken>) -> Result<()> {
        info!("[MOCK GATEWAY] unsubscribe: interest={}, token={:?}", interest, token.map(PushToken::as_str));
        self.registry.unsubscribe(interest, token);
        Ok(())
    }

    async fn notify(&self, interests: &[Interest], message: &ExpoMessage) -> Result<GatewayResponse> {
        let recipients = self.registry.recipients(interests);
        if recipients.is_empty() {
            return Err(ServerError::Gateway("No recipients for the given interests".to_string()));
        }

        info!(
            "[MOCK GATEWAY] notify: interests={:?}, recipients={}, title={:?}, body={:?}",
            interests.iter().map(Interest::as_str).collect::<Vec<_>>(),
            recipients.len(),
            message.title,
            message.body
        );

        let tickets = recipients
            .iter()
            .map(|_| PushTicket::ok(Uuid::new_v4().to_string()))
            .collect();

        self.sent.lock().push(SentPush {
            interests: interests.to_vec(),
            recipients,
            message: message.clone(),
        });

        Ok(GatewayResponse { tickets })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
