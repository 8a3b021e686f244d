use tokio::sync::broadcast;
use crate::domain::events::NotificationEvent;
use crate::error::{Result, ServerError};

/// In-process Event Bus（进程内事件总线）
///
/// 使用 tokio::sync::broadcast，订阅者落后过多时会丢失旧事件
pub struct EventBus {
    sender: broadcast::Sender<NotificationEvent>,
}

impl EventBus {
    /// 创建新的事件总线
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 发布事件，没有订阅者时返回错误
    pub fn publish(&self, event: NotificationEvent) -> Result<usize> {
        self.sender
            .send(event)
            .map_err(|e| ServerError::Internal(format!("Event bus error: {}", e)))
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
