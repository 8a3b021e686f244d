use serde::{Deserialize, Serialize};
use crate::push::types::{ExpoMessage, GatewayResponse, Interest};

/// 通知渠道名称
pub const EXPO_CHANNEL: &str = "expo-push-notifications";

/// Notification Events（通知领域事件）
///
/// 由 ExpoChannel 在每次发送后发布
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NotificationEvent {
    /// 网关已接受推送
    NotificationSent {
        channel: String,
        notifiable: String,   // 接收者 interest
        message: ExpoMessage,
        response: GatewayResponse,
        timestamp: i64,
    },

    /// 推送失败（网关错误已被捕获）
    NotificationFailed {
        channel: String,
        notifiable: String,
        message: ExpoMessage,
        error: String,
        timestamp: i64,
    },
}

impl NotificationEvent {
    pub fn sent(interest: &Interest, message: ExpoMessage, response: GatewayResponse) -> Self {
        NotificationEvent::NotificationSent {
            channel: EXPO_CHANNEL.to_string(),
            notifiable: interest.to_string(),
            message,
            response,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn failed(interest: &Interest, message: ExpoMessage, error: String) -> Self {
        NotificationEvent::NotificationFailed {
            channel: EXPO_CHANNEL.to_string(),
            notifiable: interest.to_string(),
            message,
            error,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, NotificationEvent::NotificationFailed { .. })
    }
}
