//! 订阅链（SubscriberChain）
//!
//! 每个事件类型对应一条订阅链，按订阅顺序保存处理器：
//! - 追加：在链自身的互斥区内完成“检查上限 → 追加”，保证同类型并发订阅下上限判断无竞态；
//! - 执行：读取处理器列表快照后逐个同步调用，不与追加互斥，发布不会被订阅阻塞；
//! - 任一处理器失败即停止，后续处理器不再执行，错误原样返回给发布方。
//!
use crate::error::{EventBusError, EventBusResult as Result};
use crate::handler::HandlerFn;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::any::type_name;
use std::sync::Arc;

pub struct SubscriberChain<E> {
    handlers: ArcSwap<Vec<HandlerFn<E>>>,
    append_guard: Mutex<()>,
}

impl<E> Default for SubscriberChain<E> {
    fn default() -> Self {
        Self {
            handlers: ArcSwap::from_pointee(Vec::new()),
            append_guard: Mutex::new(()),
        }
    }
}

impl<E> SubscriberChain<E>
where
    E: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// 在上限内追加处理器，返回追加后的处理器数量
    pub fn try_append(&self, handler: HandlerFn<E>, limit: usize) -> Result<usize> {
        let _guard = self.append_guard.lock();

        let current = self.handlers.load();
        if current.len() >= limit {
            return Err(EventBusError::SubscriptionLimitExceeded {
                event: type_name::<E>(),
                limit,
            });
        }

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(handler);
        let len = next.len();
        self.handlers.store(Arc::new(next));

        Ok(len)
    }

    /// 按订阅顺序同步执行全部处理器，遇到第一个错误立即返回
    pub fn execute(&self, event: &E) -> Result<()> {
        let snapshot = self.handlers.load_full();

        for handler in snapshot.iter() {
            if let Err(err) = handler(event) {
                return Err(EventBusError::Handler(err));
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handlers.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
