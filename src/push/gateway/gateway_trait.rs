use async_trait::async_trait;
use crate::error::Result;
use crate::push::types::{ExpoMessage, GatewayResponse, Interest, PushToken};

/// Push Gateway Trait（推送网关接口）
///
/// 外部推送服务的最小接口：订阅、取消订阅、按 interest 推送
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// 将设备令牌订阅到 interest
    async fn subscribe(&self, interest: &Interest, token: &PushToken) -> Result<()>;

    /// 取消订阅；token 为 None 时移除整个 interest
    async fn unsubscribe(&self, interest: &Interest, token: Option<&PushToken>) -> Result<()>;

    /// 向 interest 下的全部设备推送
    async fn notify(&self, interests: &[Interest], message: &ExpoMessage) -> Result<GatewayResponse>;

    /// 网关名称（用于日志和健康检查）
    fn name(&self) -> &'static str;
}
