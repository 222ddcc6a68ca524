use std::sync::Arc;

/// 事件处理函数：接收事件引用，失败即中断当前分发链
pub type HandlerFn<E> = Arc<dyn Fn(&E) -> anyhow::Result<()> + Send + Sync>;

/// 能够处理某类事件的对象
///
/// 供 [`EventBus::subscribe_handler`](crate::event_bus::EventBus::subscribe_handler)
/// 以对象形式注册处理器，等价于订阅 `move |e| handler.handle(e)`。
pub trait CanHandle<E>: Send + Sync
where
    E: Send + Sync + 'static,
{
    fn handle(&self, event: &E) -> anyhow::Result<()>;
}
