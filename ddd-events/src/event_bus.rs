use crate::{error::EventBusResult as Result, handler::CanHandle, publisher::CanPublish};
use std::sync::Arc;

/// 事件总线（Event Bus）
///
/// - 按事件的具体类型登记处理器，同步地把事件分发给该类型的全部处理器；
/// - 分发在调用方线程上完成，返回即表示所有处理器已执行（或其中之一失败）；
/// - 该 trait 带有泛型方法，通常以具体实现类型注入使用。
pub trait EventBus: Send + Sync {
    /// 订阅事件类型 `E`
    ///
    /// 该类型已登记的处理器数量达到上限时返回
    /// [`SubscriptionLimitExceeded`](crate::error::EventBusError::SubscriptionLimitExceeded)，处理器不会被加入。
    fn subscribe<E, F>(&self, handler: F) -> Result<()>
    where
        E: Send + Sync + 'static,
        F: Fn(&E) -> anyhow::Result<()> + Send + Sync + 'static;

    /// 以对象形式订阅，等价于 `subscribe(move |e| handler.handle(e))`
    fn subscribe_handler<E, H>(&self, handler: Arc<H>) -> Result<()>
    where
        E: Send + Sync + 'static,
        H: CanHandle<E> + 'static,
    {
        self.subscribe::<E, _>(move |event: &E| handler.handle(event))
    }

    /// 发布事件
    ///
    /// - `event`：事件实例，按订阅顺序依次交给每个处理器；
    /// - `sender`：发布者标记，仅用于让发布方显式声明身份，总线不会调用它。
    fn publish<E>(&self, event: E, sender: &dyn CanPublish<E>) -> Result<()>
    where
        E: Send + Sync + 'static,
    {
        self.publish_from(event, Some(sender))
    }

    /// 发布事件，发布者在运行时才确定
    ///
    /// `sender` 为 `None` 时在分发之前返回
    /// [`InvalidArgument`](crate::error::EventBusError::InvalidArgument)。
    fn publish_from<E>(&self, event: E, sender: Option<&dyn CanPublish<E>>) -> Result<()>
    where
        E: Send + Sync + 'static;

    /// 清空全部订阅与无订阅者记录
    fn clear(&self);
}
