//! 事件总线统一错误定义
//!
//! - 订阅超限属于配置违规，由调用方提高上限或修正重复订阅；
//! - 发布者缺失属于参数错误，在任何分发发生之前返回；
//! - 处理器错误原样透传，不做包装或日志。
//!
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EventBusError {
    #[error(
        "subscription limit exceeded: event={event}, limit={limit}; increase max_subscriptions_per_event_type or check for repeated subscription"
    )]
    SubscriptionLimitExceeded { event: &'static str, limit: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// 处理器返回的错误，保持原样，可通过 `downcast_ref` 还原具体类型
    #[error(transparent)]
    Handler(anyhow::Error),

    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl EventBusError {
    /// 若为处理器错误，取出其原始错误
    pub fn into_handler_error(self) -> Option<anyhow::Error> {
        match self {
            Self::Handler(err) => Some(err),
            _ => None,
        }
    }
}

/// 统一 Result 类型别名
pub type EventBusResult<T> = Result<T, EventBusError>;
