//! 进程内事件总线（ddd-events）
//!
//! 以事件的具体类型为键进行发布/订阅，用于在同一进程内解耦应用事件的生产者与消费者：
//! - 订阅（`subscribe`）：为某事件类型登记处理器，按订阅顺序执行；
//! - 发布（`publish`）：在调用方线程上同步分发给该类型的全部处理器，首个失败即中断并返回错误；
//! - 无订阅者反馈：发布的事件无人订阅时，记录次数与最近事件，并以 `NoSubscribers` 事件重新发布；
//! - 生命周期：`clear` 一次性清空全部订阅与记录。
//!
//! 典型用法：
//! ```rust
//! use ddd_events::{CanPublish, EventBus, InMemoryEventBus};
//!
//! #[derive(Debug)]
//! struct OrderPlaced {
//!     id: u64,
//! }
//!
//! struct Checkout;
//! impl CanPublish<OrderPlaced> for Checkout {}
//!
//! let bus = InMemoryEventBus::new();
//! bus.subscribe::<OrderPlaced, _>(|e| {
//!     assert_eq!(e.id, 1);
//!     Ok(())
//! })?;
//! bus.publish(OrderPlaced { id: 1 }, &Checkout)?;
//! # Ok::<(), ddd_events::error::EventBusError>(())
//! ```
//!
pub mod config;
pub mod error;
pub mod event_bus;
pub mod handler;
pub mod inmemory_event_bus;
pub mod no_subscribers;
pub mod publisher;
pub mod subscriber_chain;

pub use event_bus::EventBus;
pub use handler::CanHandle;
pub use inmemory_event_bus::InMemoryEventBus;
pub use no_subscribers::{NoSubscribers, NoSubscribersSnapshot};
pub use publisher::CanPublish;
