use crate::no_subscribers::NoSubscribers;

/// 发布者标记（Marker）
///
/// 不要求实现任何方法，总线也从不调用它；发布时必须携带一个实现了该标记的对象，
/// 使得所有会发布某类事件的类型都能被静态检索到（有无源码皆可）。
pub trait CanPublish<E> {}

/// 合成 `NoSubscribers` 事件时使用的发布者占位
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct NoopPublisher;

impl CanPublish<NoSubscribers> for NoopPublisher {}
