use crate::{
    config::EventBusConfig,
    error::{EventBusError, EventBusResult as Result},
    event_bus::EventBus,
    handler::HandlerFn,
    no_subscribers::NoSubscribers,
    publisher::{CanPublish, NoopPublisher},
    subscriber_chain::SubscriberChain,
};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::any::{Any, TypeId, type_name};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, trace, warn};

type AnyChain = Arc<dyn Any + Send + Sync>;

struct ChainSlot {
    event: &'static str,
    chain: AnyChain,
}

/// 事件类型 → 订阅链、事件类型 → 无订阅者记录，两张表随 `clear` 一起整体替换
#[derive(Default)]
struct Registry {
    chains: DashMap<TypeId, ChainSlot>,
    no_subscribers: DashMap<TypeId, NoSubscribers>,
}

impl Registry {
    fn chain<E>(&self) -> Result<Option<Arc<SubscriberChain<E>>>>
    where
        E: Send + Sync + 'static,
    {
        let Some((event, chain)) = self
            .chains
            .get(&TypeId::of::<E>())
            .map(|slot| (slot.event, slot.chain.clone()))
        else {
            return Ok(None);
        };

        downcast_chain::<E>(event, chain).map(Some)
    }

    fn chain_or_create<E>(&self) -> Result<Arc<SubscriberChain<E>>>
    where
        E: Send + Sync + 'static,
    {
        let (event, chain) = {
            let slot = self.chains.entry(TypeId::of::<E>()).or_insert_with(|| {
                debug!(event = type_name::<E>(), "subscriber chain created");
                ChainSlot {
                    event: type_name::<E>(),
                    chain: Arc::new(SubscriberChain::<E>::new()),
                }
            });
            (slot.event, slot.chain.clone())
        };

        downcast_chain::<E>(event, chain)
    }

    fn record_no_subscribers<E>(&self, event: E) -> (NoSubscribers, u64)
    where
        E: Send + Sync + 'static,
    {
        let entry = self
            .no_subscribers
            .entry(TypeId::of::<E>())
            .or_insert_with(|| NoSubscribers::new(type_name::<E>()))
            .clone();
        let counter = entry.record(event);

        (entry, counter)
    }
}

/// `found` 为登记该链时记录的事件类型名
fn downcast_chain<E>(found: &'static str, chain: AnyChain) -> Result<Arc<SubscriberChain<E>>>
where
    E: Send + Sync + 'static,
{
    // 键与链由同一泛型 E 生成，正常情况下不会失败
    chain
        .downcast::<SubscriberChain<E>>()
        .map_err(|_| EventBusError::TypeMismatch {
            expected: type_name::<E>(),
            found,
        })
}

/// 基于内存的 EventBus 实现
/// - 通过 TypeId 为每个事件类型惰性创建订阅链
/// - 无订阅者时记录并重新发布 `NoSubscribers` 事件（其自身无订阅者时静默丢弃）
/// - 总线实例即应用范围内的共享上下文，按需以 `Arc` 分发给生产者与消费者
pub struct InMemoryEventBus {
    registry: ArcSwap<Registry>,
    max_subscriptions_per_event_type: AtomicUsize,
    noop: NoopPublisher,
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::with_config(EventBusConfig::default())
    }
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            registry: ArcSwap::from_pointee(Registry::default()),
            max_subscriptions_per_event_type: AtomicUsize::new(
                config.max_subscriptions_per_event_type,
            ),
            noop: NoopPublisher,
        }
    }

    /// 单个事件类型的订阅上限（订阅时读取）
    pub fn max_subscriptions_per_event_type(&self) -> usize {
        self.max_subscriptions_per_event_type.load(Ordering::Acquire)
    }

    /// 调整订阅上限，只影响之后的订阅，已登记的处理器保持不变
    pub fn set_max_subscriptions_per_event_type(&self, limit: usize) {
        let previous = self
            .max_subscriptions_per_event_type
            .swap(limit, Ordering::AcqRel);
        info!(previous, limit, "max subscriptions per event type changed");
    }
}

impl EventBus for InMemoryEventBus {
    fn subscribe<E, F>(&self, handler: F) -> Result<()>
    where
        E: Send + Sync + 'static,
        F: Fn(&E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let chain = self.registry.load().chain_or_create::<E>()?;
        let limit = self.max_subscriptions_per_event_type();
        let handler: HandlerFn<E> = Arc::new(handler);

        match chain.try_append(handler, limit) {
            Ok(count) => {
                debug!(event = type_name::<E>(), count, "handler subscribed");
                Ok(())
            }
            Err(err) => {
                warn!(event = type_name::<E>(), limit, "subscription limit reached");
                Err(err)
            }
        }
    }

    fn publish_from<E>(&self, event: E, sender: Option<&dyn CanPublish<E>>) -> Result<()>
    where
        E: Send + Sync + 'static,
    {
        if sender.is_none() {
            return Err(EventBusError::InvalidArgument("sender could not be null"));
        }

        let registry = self.registry.load_full();
        if let Some(chain) = registry.chain::<E>()? {
            return chain.execute(&event);
        }

        if TypeId::of::<E>() == TypeId::of::<NoSubscribers>() {
            trace!("no subscribers for NoSubscribers, dropped");
            return Ok(());
        }

        let (entry, counter) = registry.record_no_subscribers(event);
        drop(registry);
        debug!(event = entry.event_type(), counter, "no subscribers");

        self.publish(entry, &self.noop)
    }

    fn clear(&self) {
        self.registry.store(Arc::new(Registry::default()));
        info!("event bus cleared");
    }
}

impl InMemoryEventBus {
    /// 某事件类型当前登记的处理器数量，尚未创建订阅链时为 0
    pub fn subscriber_count<E>(&self) -> Result<usize>
    where
        E: Send + Sync + 'static,
    {
        match self.registry.load().chain::<E>()? {
            Some(chain) => Ok(chain.len()),
            None => Ok(0),
        }
    }

    /// 已创建订阅链的事件类型名列表（只读视图）
    pub fn registered_events(&self) -> Vec<&'static str> {
        self.registry
            .load()
            .chains
            .iter()
            .map(|e| e.value().event)
            .collect()
    }

    /// 某事件类型的无订阅者记录，自上次 `clear` 以来从未发生时返回 `None`
    pub fn no_subscribers_for<E>(&self) -> Option<NoSubscribers>
    where
        E: Send + Sync + 'static,
    {
        self.registry
            .load()
            .no_subscribers
            .get(&TypeId::of::<E>())
            .map(|e| e.value().clone())
    }
}
