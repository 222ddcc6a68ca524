use bon::Builder;
use serde::Deserialize;

/// 默认每个事件类型允许的最大订阅数
pub const DEFAULT_MAX_SUBSCRIPTIONS_PER_EVENT_TYPE: usize = 20;

/// 事件总线配置
///
/// 可直接嵌入应用的配置文件中（缺省字段回落到默认值）：
/// ```rust
/// use ddd_events::config::EventBusConfig;
///
/// let config = EventBusConfig::builder()
///     .max_subscriptions_per_event_type(50)
///     .build();
/// assert_eq!(config.max_subscriptions_per_event_type, 50);
/// ```
#[derive(Builder, Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EventBusConfig {
    /// 单个事件类型的订阅上限，用于发现循环内重复订阅之类的错误，而非容量限制
    #[builder(default = DEFAULT_MAX_SUBSCRIPTIONS_PER_EVENT_TYPE)]
    pub max_subscriptions_per_event_type: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            max_subscriptions_per_event_type: DEFAULT_MAX_SUBSCRIPTIONS_PER_EVENT_TYPE,
        }
    }
}
