//! 无订阅者反馈（NoSubscribers）
//!
//! 某类事件发布时若尚无任何订阅者，总线会为该类型维护一条跟踪记录（计数 + 最近一次事件），
//! 并以 `NoSubscribers` 事件的形式重新发布，便于审计遗漏的订阅。
//!
//! 同一事件类型始终复用同一条记录：持有 `NoSubscribers` 的一方会看到后续发生的计数与事件变化。
//! 需要固定视图时使用 [`NoSubscribers::snapshot`]。
//!
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type AnyEvent = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
struct TrackerState {
    counter: u64,
    last_event: Option<AnyEvent>,
}

struct Tracker {
    event_type: &'static str,
    state: Mutex<TrackerState>,
}

/// 无订阅者事件：指向某事件类型的跟踪记录
#[derive(Clone)]
pub struct NoSubscribers {
    tracker: Arc<Tracker>,
}

impl NoSubscribers {
    pub(crate) fn new(event_type: &'static str) -> Self {
        Self {
            tracker: Arc::new(Tracker {
                event_type,
                state: Mutex::new(TrackerState::default()),
            }),
        }
    }

    /// 记录一次未被处理的事件，返回累计次数
    pub(crate) fn record<E>(&self, event: E) -> u64
    where
        E: Send + Sync + 'static,
    {
        let event: AnyEvent = Arc::new(event);
        let mut state = self.tracker.state.lock();
        state.counter += 1;
        state.last_event = Some(event);
        state.counter
    }

    /// 未被处理的事件类型名
    pub fn event_type(&self) -> &'static str {
        self.tracker.event_type
    }

    /// 累计无订阅者次数（实时值）
    pub fn counter(&self) -> u64 {
        self.tracker.state.lock().counter
    }

    /// 最近一次未被处理的事件（实时值）
    pub fn last_event(&self) -> Option<AnyEvent> {
        self.tracker.state.lock().last_event.clone()
    }

    /// 以具体类型取回最近一次未被处理的事件，类型不符时返回 `None`
    pub fn last_event_as<E>(&self) -> Option<Arc<E>>
    where
        E: Send + Sync + 'static,
    {
        self.last_event().and_then(|e| e.downcast::<E>().ok())
    }

    /// 当前计数与事件的不可变副本
    pub fn snapshot(&self) -> NoSubscribersSnapshot {
        let state = self.tracker.state.lock();
        NoSubscribersSnapshot {
            event_type: self.tracker.event_type,
            counter: state.counter,
            last_event: state.last_event.clone(),
        }
    }

    /// 是否指向同一条跟踪记录
    pub fn same_tracker(&self, other: &NoSubscribers) -> bool {
        Arc::ptr_eq(&self.tracker, &other.tracker)
    }
}

impl fmt::Debug for NoSubscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoSubscribers")
            .field("event_type", &self.event_type())
            .field("counter", &self.counter())
            .finish()
    }
}

/// `NoSubscribers` 在某一时刻的副本，不随后续发布变化
#[derive(Clone)]
pub struct NoSubscribersSnapshot {
    pub event_type: &'static str,
    pub counter: u64,
    pub last_event: Option<AnyEvent>,
}

impl NoSubscribersSnapshot {
    pub fn last_event_as<E>(&self) -> Option<Arc<E>>
    where
        E: Send + Sync + 'static,
    {
        self.last_event.clone().and_then(|e| e.downcast::<E>().ok())
    }
}

impl fmt::Debug for NoSubscribersSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoSubscribersSnapshot")
            .field("event_type", &self.event_type)
            .field("counter", &self.counter)
            .field("has_last_event", &self.last_event.is_some())
            .finish()
    }
}
