use anyhow::Context;
use ddd_events::config::EventBusConfig;
use ddd_events::error::EventBusError;
use ddd_events::{CanHandle, CanPublish, EventBus, InMemoryEventBus, NoSubscribers};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct OrderPlaced {
    order_id: u64,
    sku: String,
    quantity: u32,
    amount_cents: i64,
}

#[derive(Debug, Clone)]
struct OrderCancelled {
    order_id: u64,
}

#[derive(Debug, thiserror::Error)]
enum BillingError {
    #[error("invalid amount for order {order_id}: {amount_cents}")]
    InvalidAmount { order_id: u64, amount_cents: i64 },
}

/// 下单服务：唯一的订单事件发布方
struct OrderService {
    bus: Arc<InMemoryEventBus>,
}

impl CanPublish<OrderPlaced> for OrderService {}
impl CanPublish<OrderCancelled> for OrderService {}

impl OrderService {
    fn place(&self, order_id: u64, sku: &str, quantity: u32, amount_cents: i64) {
        let event = OrderPlaced {
            order_id,
            sku: sku.to_string(),
            quantity,
            amount_cents,
        };

        match self.bus.publish(event, self) {
            Ok(()) => info!(order_id, "order placed"),
            Err(EventBusError::Handler(err)) => error!(order_id, %err, "order rejected"),
            Err(err) => error!(order_id, %err, "publish failed"),
        }
    }

    fn cancel(&self, order_id: u64) -> anyhow::Result<()> {
        self.bus.publish(OrderCancelled { order_id }, self)?;
        Ok(())
    }
}

/// 库存：以对象形式订阅
#[derive(Default)]
struct Inventory {
    reserved: Mutex<HashMap<String, u32>>,
}

impl CanHandle<OrderPlaced> for Inventory {
    fn handle(&self, event: &OrderPlaced) -> anyhow::Result<()> {
        let mut reserved = self.reserved.lock();
        *reserved.entry(event.sku.clone()).or_default() += event.quantity;
        info!(sku = %event.sku, quantity = event.quantity, "stock reserved");
        Ok(())
    }
}

fn load_config() -> anyhow::Result<EventBusConfig> {
    match std::env::var("EVENT_BUS_CONFIG") {
        Ok(raw) => serde_json::from_str(&raw).context("parse EVENT_BUS_CONFIG"),
        Err(_) => Ok(EventBusConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ddd_events=debug")),
        )
        .init();

    let config = load_config()?;
    info!(?config, "event bus config loaded");
    let bus = Arc::new(InMemoryEventBus::with_config(config));

    let inventory = Arc::new(Inventory::default());
    bus.subscribe_handler::<OrderPlaced, _>(inventory.clone())?;
    bus.subscribe::<OrderPlaced, _>(|e| {
        if e.amount_cents <= 0 {
            return Err(BillingError::InvalidAmount {
                order_id: e.order_id,
                amount_cents: e.amount_cents,
            }
            .into());
        }
        info!(order_id = e.order_id, amount_cents = e.amount_cents, "invoice issued");
        Ok(())
    })?;
    bus.subscribe::<NoSubscribers, _>(|ns| {
        warn!(event = ns.event_type(), counter = ns.counter(), "event had no subscribers");
        Ok(())
    })?;

    let orders = OrderService { bus: bus.clone() };
    orders.place(1, "book", 2, 3_000);
    // 计费失败：库存已预留，之后的处理器不再执行
    orders.place(2, "pen", 1, 0);
    orders.cancel(1)?;
    orders.cancel(2)?;

    if let Some(entry) = bus.no_subscribers_for::<OrderCancelled>() {
        let last = entry
            .last_event_as::<OrderCancelled>()
            .map(|e| e.order_id);
        info!(counter = entry.counter(), ?last, "unhandled cancellations");
    }

    // 循环内重复订阅会触发上限
    for attempt in 1.. {
        if let Err(err) = bus.subscribe::<OrderCancelled, _>(|_| Ok(())) {
            warn!(attempt, %err, "stopped subscribing");
            break;
        }
    }

    info!(events = ?bus.registered_events(), "registered events");
    bus.clear();
    orders.cancel(3)?;
    let counter = bus
        .no_subscribers_for::<OrderCancelled>()
        .map(|e| e.counter())
        .unwrap_or_default();
    info!(counter, "after clear");

    let reserved = inventory.reserved.lock().clone();
    info!(?reserved, "final reservations");

    Ok(())
}
