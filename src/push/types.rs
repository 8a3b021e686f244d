use std::fmt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Expo 推送令牌的前缀（旧版 `ExponentPushToken`，新版 `ExpoPushToken`）
const TOKEN_PREFIXES: [&str; 2] = ["ExponentPushToken[", "ExpoPushToken["];

/// 推送令牌
///
/// 由设备端签发的不透明字符串，只做格式校验，不解析内容
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PushToken(String);

impl PushToken {
    /// 校验并构造令牌，格式须为 `ExponentPushToken[...]`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let inner = TOKEN_PREFIXES
            .iter()
            .find_map(|prefix| raw.strip_prefix(prefix))
            .and_then(|rest| rest.strip_suffix(']'))?;

        if inner.is_empty()
            || inner.chars().any(|c| c == '[' || c == ']' || c.is_whitespace())
        {
            return None;
        }

        Some(Self(raw.to_string()))
    }

    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_some()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PushToken {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid expo push token: {}", value))
    }
}

impl From<PushToken> for String {
    fn from(token: PushToken) -> Self {
        token.0
    }
}

impl fmt::Display for PushToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Interest（网关侧的主题，一个逻辑接收者对应多个设备令牌）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Interest(String);

impl Interest {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// 由命名空间和唯一键生成，例如 `App.User` + `1` => `App.User.1`
    pub fn from_parts(namespace: &str, key: &str) -> Self {
        Self(format!("{}.{}", namespace, key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 推送优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExpoPriority {
    #[default]
    Default,
    Normal,
    High,
}

/// Expo 推送消息
///
/// 由通知对象生成，字段与 Expo Push API 一一对应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpoMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub sound: String,
    pub badge: u32,
    /// 有效期（秒），0 表示不保留
    pub ttl: u32,
    pub priority: ExpoPriority,
    /// Android 通知渠道
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl Default for ExpoMessage {
    fn default() -> Self {
        Self {
            title: None,
            body: None,
            sound: "default".to_string(),
            badge: 0,
            ttl: 0,
            priority: ExpoPriority::Default,
            channel_id: None,
            data: None,
        }
    }
}

impl ExpoMessage {
    /// 以正文创建消息
    pub fn create(body: impl Into<String>) -> Self {
        Self::default().body(body)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = sound.into();
        self
    }

    /// 关闭提示音
    pub fn silent(mut self) -> Self {
        self.sound = String::new();
        self
    }

    pub fn badge(mut self, badge: u32) -> Self {
        self.badge = badge;
        self
    }

    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn priority(mut self, priority: ExpoPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// 附加数据，非对象的值会被忽略
    pub fn data(mut self, data: Value) -> Self {
        if let Value::Object(map) = data {
            self.data = Some(map);
        }
        self
    }

    /// 转换为 Expo 请求体（不含 `to`）
    pub fn to_payload(&self) -> Value {
        let mut payload = serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()));
        if self.sound.is_empty() {
            if let Value::Object(map) = &mut payload {
                map.remove("sound");
            }
        }
        payload
    }
}

/// Expo 推送回执
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushTicket {
    /// "ok" 或 "error"
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl PushTicket {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            id: Some(id.into()),
            message: None,
            details: None,
        }
    }

    /// 未送达的错误回执
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            id: None,
            message: Some(message.into()),
            details: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// `details.error` 错误码，例如 `DeviceNotRegistered`
    pub fn error_code(&self) -> Option<&str> {
        self.details.as_ref()?.get("error")?.as_str()
    }
}

/// 网关响应
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub tickets: Vec<PushTicket>,
}

impl GatewayResponse {
    pub fn failed_count(&self) -> usize {
        self.tickets.iter().filter(|t| !t.is_ok()).count()
    }
}
