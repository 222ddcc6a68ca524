/// 无订阅者审计示例
/// 展示订阅 `NoSubscribers` 观察遗漏订阅的事件类型，以及实时记录与快照的区别
use ddd_events::{CanPublish, EventBus, InMemoryEventBus, NoSubscribers};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct UserRegistered {
    name: String,
}

#[derive(Debug)]
struct PasswordReset {
    user: String,
}

struct AccountService;
impl CanPublish<UserRegistered> for AccountService {}
impl CanPublish<PasswordReset> for AccountService {}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bus = InMemoryEventBus::new();

    bus.subscribe::<UserRegistered, _>(|e| {
        println!("welcome mail -> {}", e.name);
        Ok(())
    })?;

    let audit: Arc<Mutex<Vec<NoSubscribers>>> = Arc::default();
    {
        let audit = audit.clone();
        bus.subscribe::<NoSubscribers, _>(move |ns| {
            println!("no subscribers: event={} counter={}", ns.event_type(), ns.counter());
            audit.lock().unwrap().push(ns.clone());
            Ok(())
        })?;
    }

    bus.publish(
        UserRegistered {
            name: "alice".into(),
        },
        &AccountService,
    )?;
    bus.publish(
        PasswordReset {
            user: "alice".into(),
        },
        &AccountService,
    )?;
    bus.publish(PasswordReset { user: "bob".into() }, &AccountService)?;

    // 审计方持有的是同一条记录：第一次收到的句柄此时也能看到第二次的结果
    let audit = audit.lock().unwrap();
    let first = &audit[0];
    let snapshot = first.snapshot();
    println!(
        "held entry: counter={} last={:?}",
        snapshot.counter,
        snapshot.last_event_as::<PasswordReset>().map(|e| e.user.clone())
    );

    Ok(())
}
