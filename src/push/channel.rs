use std::sync::Arc;
use tracing::{debug, error, info, warn};
use crate::error::Result;
use crate::infra::event_bus::EventBus;
use crate::domain::events::NotificationEvent;
use crate::push::gateway::PushGateway;
use crate::push::types::{ExpoMessage, GatewayResponse, Interest, PushToken};

/// 可接收推送的实体（通常是用户）
pub trait Notifiable: Send + Sync {
    /// 类型命名空间，例如 `App.User`
    fn notifiable_type(&self) -> &str;

    /// 稳定的唯一键
    fn notifiable_key(&self) -> String;

    /// 自定义 interest，返回 None 时使用 `{type}.{key}`
    fn route_interest(&self) -> Option<Interest> {
        None
    }

    /// 实体自带的设备令牌（可选）
    fn expo_token(&self) -> Option<PushToken> {
        None
    }
}

/// 可通过 Expo 渠道发送的通知
pub trait ExpoNotification: Send + Sync {
    fn to_expo_push(&self, notifiable: &dyn Notifiable) -> ExpoMessage;
}

/// 一次发送的结果
#[derive(Debug, Clone)]
pub enum DeliveryOutcome {
    Sent(GatewayResponse),
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent(_))
    }
}

/// Expo Channel（推送渠道适配器）
///
/// 职责：
/// - 计算接收者的 interest
/// - 从通知生成 Expo 消息并交给网关
/// - 发布发送成功/失败事件，网关错误不向上抛出
pub struct ExpoChannel {
    gateway: Arc<dyn PushGateway>,
    events: Arc<EventBus>,
}

impl ExpoChannel {
    pub fn new(gateway: Arc<dyn PushGateway>, events: Arc<EventBus>) -> Self {
        Self { gateway, events }
    }

    pub fn gateway(&self) -> &Arc<dyn PushGateway> {
        &self.gateway
    }

    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    /// 接收者默认的 interest 名称
    pub fn interest_name(&self, notifiable: &dyn Notifiable) -> Interest {
        Interest::from_parts(notifiable.notifiable_type(), &notifiable.notifiable_key())
    }

    fn resolve_interest(&self, notifiable: &dyn Notifiable) -> Interest {
        notifiable
            .route_interest()
            .unwrap_or_else(|| self.interest_name(notifiable))
    }

    /// 发送通知
    pub async fn send(
        &self,
        notifiable: &dyn Notifiable,
        notification: &dyn ExpoNotification,
    ) -> DeliveryOutcome {
        let interest = self.resolve_interest(notifiable);
        let message = notification.to_expo_push(notifiable);

        match self.deliver(notifiable, &interest, &message).await {
            Ok(response) => {
                info!(
                    "[EXPO CHANNEL] Notification sent: interest={}, tickets={}",
                    interest,
                    response.tickets.len()
                );
                self.dispatch(NotificationEvent::sent(&interest, message, response.clone()));
                DeliveryOutcome::Sent(response)
            }
            Err(e) => {
                error!("[EXPO CHANNEL] Notification failed: interest={}, error={}", interest, e);
                let reason = e.to_string();
                self.dispatch(NotificationEvent::failed(&interest, message, reason.clone()));
                DeliveryOutcome::Failed(reason)
            }
        }
    }

    async fn deliver(
        &self,
        notifiable: &dyn Notifiable,
        interest: &Interest,
        message: &ExpoMessage,
    ) -> Result<GatewayResponse> {
        if let Some(token) = notifiable.expo_token() {
            self.gateway.subscribe(interest, &token).await?;
        }
        self.gateway.notify(std::slice::from_ref(interest), message).await
    }

    /// 将设备令牌订阅到接收者的 interest
    pub async fn subscribe(&self, notifiable: &dyn Notifiable, token: &PushToken) -> Result<Interest> {
        let interest = self.interest_name(notifiable);
        self.gateway.subscribe(&interest, token).await?;
        Ok(interest)
    }

    /// 取消订阅；token 为 None 时移除整个 interest
    pub async fn unsubscribe(
        &self,
        notifiable: &dyn Notifiable,
        token: Option<&PushToken>,
    ) -> Result<Interest> {
        let interest = self.interest_name(notifiable);
        self.gateway.unsubscribe(&interest, token).await?;
        Ok(interest)
    }

    fn dispatch(&self, event: NotificationEvent) {
        if self.events.subscriber_count() == 0 {
            debug!("[EXPO CHANNEL] No event subscribers, dropping event");
            return;
        }
        if let Err(e) = self.events.publish(event) {
            warn!("[EXPO CHANNEL] Failed to publish event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::gateway::MockGateway;

    struct User {
        id: u64,
        token: Option<PushToken>,
    }

    impl Notifiable for User {
        fn notifiable_type(&self) -> &str {
            "App.User"
        }

        fn notifiable_key(&self) -> String {
            self.id.to_string()
        }

        fn expo_token(&self) -> Option<PushToken> {
            self.token.clone()
        }
    }

    struct Team;

    impl Notifiable for Team {
        fn notifiable_type(&self) -> &str {
            "App.Team"
        }

        fn notifiable_key(&self) -> String {
            "9".to_string()
        }

        fn route_interest(&self) -> Option<Interest> {
            Some(Interest::new("team-broadcast"))
        }
    }

    struct Greeting;

    impl ExpoNotification for Greeting {
        fn to_expo_push(&self, notifiable: &dyn Notifiable) -> ExpoMessage {
            ExpoMessage::create(format!("hello {}", notifiable.notifiable_key())).title("hi")
        }
    }

    fn channel() -> (ExpoChannel, Arc<MockGateway>) {
        let gateway = Arc::new(MockGateway::new());
        let channel = ExpoChannel::new(gateway.clone(), Arc::new(EventBus::new()));
        (channel, gateway)
    }

    #[test]
    fn test_interest_name_uses_type_and_key() {
        let (channel, _) = channel();
        let user = User { id: 1, token: None };
        assert_eq!(channel.interest_name(&user).as_str(), "App.User.1");
    }

    #[tokio::test]
    async fn test_send_with_own_token_subscribes_first() {
        let (channel, gateway) = channel();
        let user = User {
            id: 5,
            token: PushToken::parse("ExponentPushToken[user5]"),
        };

        let outcome = channel.send(&user, &Greeting).await;

        assert!(outcome.is_sent());
        let sent = gateway.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].interests[0].as_str(), "App.User.5");
        assert_eq!(sent[0].message.body.as_deref(), Some("hello 5"));
    }

    #[tokio::test]
    async fn test_routed_interest_overrides_default() {
        let (channel, gateway) = channel();
        let token = PushToken::parse("ExponentPushToken[team]").unwrap();
        gateway
            .subscribe(&Interest::new("team-broadcast"), &token)
            .await
            .unwrap();

        let outcome = channel.send(&Team, &Greeting).await;

        assert!(outcome.is_sent());
        assert_eq!(gateway.sent()[0].interests[0].as_str(), "team-broadcast");
    }

    #[tokio::test]
    async fn test_send_without_subscribers_fails_quietly() {
        let (channel, _) = channel();
        let mut events = channel.events().subscribe();

        let outcome = channel.send(&User { id: 2, token: None }, &Greeting).await;

        assert!(!outcome.is_sent());
        let event = events.recv().await.unwrap();
        assert!(event.is_failure());
    }
}
