use dashmap::DashMap;
use tracing::debug;
use crate::push::types::{Interest, PushToken};

/// Interest 订阅表（进程内）
///
/// interest => 设备令牌列表，按订阅顺序保存，不重复
#[derive(Debug, Default)]
pub struct InterestRegistry {
    interests: DashMap<String, Vec<PushToken>>,
}

impl InterestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅，重复订阅无副作用
    pub fn subscribe(&self, interest: &Interest, token: &PushToken) {
        let mut tokens = self.interests.entry(interest.as_str().to_string()).or_default();
        if !tokens.contains(token) {
            tokens.push(token.clone());
            debug!("[REGISTRY] subscribed: interest={}, token={}", interest, token);
        }
    }

    /// 取消订阅
    ///
    /// 指定 token 时只移除该设备，否则移除整个 interest。返回是否有变化
    pub fn unsubscribe(&self, interest: &Interest, token: Option<&PushToken>) -> bool {
        match token {
            Some(token) => {
                let mut removed = false;
                if let Some(mut tokens) = self.interests.get_mut(interest.as_str()) {
                    let before = tokens.len();
                    tokens.retain(|t| t != token);
                    removed = tokens.len() != before;
                }
                self.interests.remove_if(interest.as_str(), |_, tokens| tokens.is_empty());
                removed
            }
            None => self.interests.remove(interest.as_str()).is_some(),
        }
    }

    /// 从所有 interest 中移除某个设备令牌（设备已注销）
    pub fn forget_token(&self, token: &PushToken) {
        for mut entry in self.interests.iter_mut() {
            entry.value_mut().retain(|t| t != token);
        }
        self.interests.retain(|_, tokens| !tokens.is_empty());
    }

    pub fn tokens(&self, interest: &Interest) -> Vec<PushToken> {
        self.interests
            .get(interest.as_str())
            .map(|tokens| tokens.value().clone())
            .unwrap_or_default()
    }

    /// 多个 interest 的令牌并集（保持顺序，去重）
    pub fn recipients(&self, interests: &[Interest]) -> Vec<PushToken> {
        let mut recipients: Vec<PushToken> = Vec::new();
        for interest in interests {
            for token in self.tokens(interest) {
                if !recipients.contains(&token) {
                    recipients.push(token);
                }
            }
        }
        recipients
    }

    pub fn is_subscribed(&self, interest: &Interest) -> bool {
        self.interests.contains_key(interest.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(s: &str) -> PushToken {
        PushToken::parse(&format!("ExponentPushToken[{}]", s)).unwrap()
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let registry = InterestRegistry::new();
        let interest = Interest::new("App.User.1");
        registry.subscribe(&interest, &token("a"));
        registry.subscribe(&interest, &token("a"));
        registry.subscribe(&interest, &token("b"));

        assert_eq!(registry.tokens(&interest), vec![token("a"), token("b")]);
    }

    #[test]
    fn test_unsubscribe_single_token_then_interest_disappears() {
        let registry = InterestRegistry::new();
        let interest = Interest::new("App.User.1");
        registry.subscribe(&interest, &token("a"));

        assert!(registry.unsubscribe(&interest, Some(&token("a"))));
        assert!(!registry.is_subscribed(&interest));
        assert!(!registry.unsubscribe(&interest, None));
    }

    #[test]
    fn test_recipients_union_and_forget() {
        let registry = InterestRegistry::new();
        let one = Interest::new("App.User.1");
        let two = Interest::new("App.User.2");
        registry.subscribe(&one, &token("a"));
        registry.subscribe(&two, &token("a"));
        registry.subscribe(&two, &token("b"));

        assert_eq!(registry.recipients(&[one.clone(), two.clone()]), vec![token("a"), token("b")]);

        registry.forget_token(&token("a"));
        assert!(!registry.is_subscribed(&one));
        assert_eq!(registry.tokens(&two), vec![token("b")]);
    }
}
