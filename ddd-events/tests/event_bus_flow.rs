use ddd_events::config::EventBusConfig;
use ddd_events::error::EventBusError;
use ddd_events::{CanHandle, CanPublish, EventBus, InMemoryEventBus, NoSubscribers};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
struct Order {
    id: u64,
}

#[derive(Debug, Clone, PartialEq)]
struct Refund {
    order_id: u64,
}

struct OrderService;
impl CanPublish<Order> for OrderService {}
impl CanPublish<Refund> for OrderService {}

#[derive(Debug, thiserror::Error)]
#[error("ledger unavailable")]
struct LedgerUnavailable;

type Log = Arc<Mutex<Vec<String>>>;

fn record(
    log: &Log,
    tag: &'static str,
) -> impl Fn(&Order) -> anyhow::Result<()> + Send + Sync + 'static {
    let log = log.clone();
    move |order: &Order| -> anyhow::Result<()> {
        log.lock().unwrap().push(format!("{tag}({})", order.id));
        Ok(())
    }
}

#[test]
fn handlers_run_once_each_in_subscription_order() {
    let bus = InMemoryEventBus::new();
    let log: Log = Arc::default();
    bus.subscribe::<Order, _>(record(&log, "A")).unwrap();
    bus.subscribe::<Order, _>(record(&log, "B")).unwrap();

    bus.publish(Order { id: 1 }, &OrderService).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["A(1)", "B(1)"]);
}

#[test]
fn subscription_over_limit_is_rejected_and_not_added() {
    let bus = InMemoryEventBus::new();
    let log: Log = Arc::default();
    for _ in 0..20 {
        bus.subscribe::<Order, _>(record(&log, "ok")).unwrap();
    }

    let err = bus.subscribe::<Order, _>(record(&log, "extra")).unwrap_err();
    match err {
        EventBusError::SubscriptionLimitExceeded { event, limit } => {
            assert!(event.contains("Order"));
            assert_eq!(limit, 20);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    bus.publish(Order { id: 2 }, &OrderService).unwrap();
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 20);
    assert!(log.iter().all(|entry| entry == "ok(2)"));
}

#[test]
fn missing_sender_fails_before_dispatch() {
    let bus = InMemoryEventBus::new();
    let log: Log = Arc::default();
    bus.subscribe::<Order, _>(record(&log, "A")).unwrap();

    let err = bus.publish_from(Order { id: 3 }, None).unwrap_err();

    assert!(matches!(err, EventBusError::InvalidArgument(_)));
    assert!(log.lock().unwrap().is_empty());
    assert!(bus.no_subscribers_for::<Order>().is_none());
}

#[test]
fn dynamic_sender_dispatches_like_publish() {
    let bus = InMemoryEventBus::new();
    let log: Log = Arc::default();
    bus.subscribe::<Order, _>(record(&log, "A")).unwrap();

    let service = OrderService;
    let sender: &dyn CanPublish<Order> = &service;
    bus.publish_from(Order { id: 4 }, Some(sender)).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["A(4)"]);
}

#[test]
fn unhandled_events_are_counted_and_last_one_kept() {
    let bus = InMemoryEventBus::new();

    bus.publish(Refund { order_id: 1 }, &OrderService).unwrap();
    let entry = bus.no_subscribers_for::<Refund>().unwrap();
    assert_eq!(entry.counter(), 1);
    assert_eq!(
        entry.last_event_as::<Refund>().as_deref(),
        Some(&Refund { order_id: 1 })
    );

    bus.publish(Refund { order_id: 2 }, &OrderService).unwrap();
    assert_eq!(entry.counter(), 2);
    assert_eq!(
        entry.last_event_as::<Refund>().as_deref(),
        Some(&Refund { order_id: 2 })
    );
    assert!(entry.event_type().contains("Refund"));
}

#[test]
fn no_subscribers_without_observer_does_not_recurse() {
    struct Auditor;
    impl CanPublish<NoSubscribers> for Auditor {}

    let bus = InMemoryEventBus::new();
    bus.publish(Refund { order_id: 1 }, &OrderService).unwrap();

    let entry = bus.no_subscribers_for::<Refund>().unwrap();
    bus.publish(entry, &Auditor).unwrap();

    assert!(bus.no_subscribers_for::<NoSubscribers>().is_none());
    assert_eq!(bus.no_subscribers_for::<Refund>().unwrap().counter(), 1);
}

#[test]
fn observer_sees_the_same_mutating_entry() {
    let bus = InMemoryEventBus::new();
    let held: Arc<Mutex<Vec<NoSubscribers>>> = Arc::default();
    {
        let held = held.clone();
        bus.subscribe::<NoSubscribers, _>(move |ns| {
            held.lock().unwrap().push(ns.clone());
            Ok(())
        })
        .unwrap();
    }

    bus.publish(Refund { order_id: 1 }, &OrderService).unwrap();
    bus.publish(Refund { order_id: 2 }, &OrderService).unwrap();

    let held = held.lock().unwrap();
    assert_eq!(held.len(), 2);
    assert!(held[0].same_tracker(&held[1]));
    assert_eq!(held[0].counter(), 2);
}

#[test]
fn failing_handler_stops_the_chain() {
    let bus = InMemoryEventBus::new();
    let log: Log = Arc::default();
    bus.subscribe::<Order, _>(record(&log, "first")).unwrap();
    bus.subscribe::<Order, _>(|_| Err(LedgerUnavailable.into()))
        .unwrap();
    bus.subscribe::<Order, _>(record(&log, "third")).unwrap();

    let err = bus.publish(Order { id: 5 }, &OrderService).unwrap_err();

    assert_eq!(*log.lock().unwrap(), vec!["first(5)"]);
    let source = err.into_handler_error().expect("handler error");
    assert!(source.downcast_ref::<LedgerUnavailable>().is_some());
}

#[test]
fn clear_drops_handlers_and_restarts_counters() {
    let bus = InMemoryEventBus::new();
    let log: Log = Arc::default();
    bus.subscribe::<Order, _>(record(&log, "A")).unwrap();
    bus.publish(Refund { order_id: 1 }, &OrderService).unwrap();
    bus.publish(Refund { order_id: 2 }, &OrderService).unwrap();

    bus.clear();
    bus.publish(Order { id: 6 }, &OrderService).unwrap();
    bus.publish(Refund { order_id: 3 }, &OrderService).unwrap();

    assert!(log.lock().unwrap().is_empty());
    assert_eq!(bus.no_subscribers_for::<Order>().unwrap().counter(), 1);
    assert_eq!(bus.no_subscribers_for::<Refund>().unwrap().counter(), 1);
}

#[test]
fn capability_objects_and_closures_share_one_chain() {
    struct Shipping {
        log: Log,
    }
    impl CanHandle<Order> for Shipping {
        fn handle(&self, event: &Order) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("ship({})", event.id));
            Ok(())
        }
    }

    let bus = InMemoryEventBus::with_config(
        EventBusConfig::builder()
            .max_subscriptions_per_event_type(2)
            .build(),
    );
    let log: Log = Arc::default();
    bus.subscribe::<Order, _>(record(&log, "bill")).unwrap();
    bus.subscribe_handler::<Order, _>(Arc::new(Shipping { log: log.clone() }))
        .unwrap();
    assert!(bus.subscribe::<Order, _>(record(&log, "late")).is_err());

    bus.publish(Order { id: 7 }, &OrderService).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["bill(7)", "ship(7)"]);
}

#[test]
fn subscribe_inside_handler_applies_to_next_publish() {
    let bus = Arc::new(InMemoryEventBus::new());
    let log: Log = Arc::default();
    {
        let weak = Arc::downgrade(&bus);
        let log = log.clone();
        bus.subscribe::<Order, _>(move |order: &Order| {
            log.lock().unwrap().push(format!("A({})", order.id));
            if order.id == 1 {
                if let Some(bus) = weak.upgrade() {
                    bus.subscribe::<Order, _>(record(&log, "late"))?;
                }
            }
            Ok(())
        })
        .unwrap();
    }

    bus.publish(Order { id: 1 }, &OrderService).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["A(1)"]);
    assert_eq!(bus.subscriber_count::<Order>().unwrap(), 2);

    bus.publish(Order { id: 2 }, &OrderService).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["A(1)", "A(2)", "late(2)"]);
}

#[test]
fn clear_during_dispatch_finishes_old_chain() {
    let bus = Arc::new(InMemoryEventBus::new());
    let log: Log = Arc::default();
    {
        let weak = Arc::downgrade(&bus);
        let log = log.clone();
        bus.subscribe::<Order, _>(move |order: &Order| {
            log.lock().unwrap().push(format!("A({})", order.id));
            if let Some(bus) = weak.upgrade() {
                bus.clear();
            }
            Ok(())
        })
        .unwrap();
    }
    bus.subscribe::<Order, _>(record(&log, "B")).unwrap();

    bus.publish(Order { id: 1 }, &OrderService).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["A(1)", "B(1)"]);
    assert!(bus.registered_events().is_empty());

    bus.publish(Order { id: 2 }, &OrderService).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["A(1)", "B(1)"]);
    assert_eq!(bus.no_subscribers_for::<Order>().unwrap().counter(), 1);
}

#[test]
fn no_subscribers_observer_error_reaches_original_publisher() {
    let bus = InMemoryEventBus::new();
    bus.subscribe::<NoSubscribers, _>(|_| Err(LedgerUnavailable.into()))
        .unwrap();

    let err = bus
        .publish(Refund { order_id: 8 }, &OrderService)
        .unwrap_err();

    let source = err.into_handler_error().expect("handler error");
    assert!(source.downcast_ref::<LedgerUnavailable>().is_some());
    assert_eq!(bus.no_subscribers_for::<Refund>().unwrap().counter(), 1);
}
