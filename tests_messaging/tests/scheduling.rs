//! Scheduling and Failure Reporting Tests
//!
//! Validates dispatch filters, delayed delivery, inbox limits from
//! configuration, and status reports for listener failures on a remote
//! manager.

use component_manager::test_utils::{
    test_registry, FailingListener, RecordingListener, ECHO_COMPONENT,
};
use component_manager::{
    ComponentManager, ListenerHandle, ManagerConfig, Messenger, NextWakeup,
};
use core_types::{Address, Duration, ManagerId};
use ipc::{DestinationSelection, Message, MessageType, SendFlags, StatusCode, StatusReport};
use platform_api::MessagingError;
use sim_platform::SimNetwork;
use std::cell::RefCell;
use std::rc::Rc;
use tests_messaging::{init_tracing, request_from, spawn_managers, test_network};

const FAILING_COMPONENT: &str = "failing";

/// Component whose root channel rejects everything
fn failing_factory(manager: &mut ComponentManager, component: Address) -> Result<(), MessagingError> {
    let failing = Rc::new(RefCell::new(FailingListener::new("rejected")));
    let handle: ListenerHandle = failing.clone();
    let mut created = manager.component(component)?;
    created.retain(failing)?;
    if let Some(root) = created.root_channel()? {
        manager.channel(root)?.add_listener_with(&handle, true)?;
    }
    Ok(())
}

fn ping(value: u32) -> Message {
    Message::domain("ping", &value).unwrap()
}

/// Test: A filter holds remote traffic back until it is removed
#[test]
fn test_filter_holds_remote_traffic() {
    let network = test_network();
    network.place(ECHO_COMPONENT, ManagerId::new(1));
    let mut managers = spawn_managers(&network, 2);
    let (recorder, handle) = RecordingListener::handle();
    let requester =
        request_from(&mut managers[0], ECHO_COMPONENT, Some(&handle)).expect("Request failed");
    network.run_until_idle(&mut managers);
    recorder.borrow_mut().clear();

    let filter = managers[1].add_message_filter(Box::new(DestinationSelection {
        manager: ManagerId::new(1),
        component: None,
    }));
    managers[0]
        .channel(requester)
        .unwrap()
        .send(ping(1), SendFlags::NONE)
        .expect("Failed to send");
    network.run_until_idle(&mut managers);

    assert_eq!(recorder.borrow().count(), 0);
    assert_eq!(managers[1].pending_messages(), 1);
    assert_eq!(managers[1].next_wakeup(), NextWakeup::Infinite);

    assert!(managers[1].remove_message_filter(filter));
    network.run_until_idle(&mut managers);
    assert_eq!(recorder.borrow().count(), 1);
}

/// Test: A delayed message is dispatched once its delay has passed
#[test]
fn test_delayed_message_across_managers() {
    let network = test_network();
    network.place(ECHO_COMPONENT, ManagerId::new(1));
    let mut managers = spawn_managers(&network, 2);
    let (recorder, handle) = RecordingListener::handle();
    let requester =
        request_from(&mut managers[0], ECHO_COMPONENT, Some(&handle)).expect("Request failed");
    network.run_until_idle(&mut managers);
    recorder.borrow_mut().clear();

    managers[0]
        .channel(requester)
        .unwrap()
        .send(ping(2).with_delay(Duration::from_millis(20)), SendFlags::NONE)
        .expect("Failed to send");
    network.run_until_idle(&mut managers);
    assert_eq!(recorder.borrow().count(), 0);
    assert_eq!(
        managers[1].next_wakeup(),
        NextWakeup::After(Duration::from_millis(20))
    );

    network.advance(Duration::from_millis(20));
    network.run_until_idle(&mut managers);
    assert_eq!(recorder.borrow().count(), 1);
}

/// Test: Due messages are dispatched in arrival order
#[test]
fn test_run_slice_dispatch_order() {
    let network = test_network();
    let mut managers = spawn_managers(&network, 1);
    let order = Rc::new(RefCell::new(Vec::new()));
    let seen = order.clone();
    let listener = component_manager::listener_fn(
        move |message: &Message, _: &mut ComponentManager| {
            seen.borrow_mut().push(message.decode::<u32>()?);
            Ok(())
        },
    );
    managers[0].add_listener(&listener);

    let target = managers[0].address();
    let send = |managers: &mut [ComponentManager], value: u32, delay: u64| {
        managers[0]
            .send(
                ping(value)
                    .with_destination(target)
                    .with_delay(Duration::from_millis(delay)),
                SendFlags::NONE,
            )
            .unwrap();
    };
    send(&mut managers[..], 1, 30);
    send(&mut managers[..], 2, 10);
    send(&mut managers[..], 3, 10);
    send(&mut managers[..], 4, 0);

    assert_eq!(
        managers[0].run_slice(1_000),
        NextWakeup::After(Duration::from_millis(10))
    );
    assert_eq!(*order.borrow(), vec![4]);

    network.advance(Duration::from_millis(10));
    managers[0].run_slice(1_000);
    assert_eq!(*order.borrow(), vec![4, 2, 3]);

    // Once everything is due, arrival order decides.
    send(&mut managers[..], 5, 0);
    network.advance(Duration::from_millis(20));
    assert_eq!(managers[0].run_slice(1_000), NextWakeup::Infinite);
    assert_eq!(*order.borrow(), vec![4, 2, 3, 1, 5]);
}

/// Test: A listener failure on a remote manager comes back as a status report
#[test]
fn test_remote_listener_failure_reported() {
    init_tracing();
    let mut registry = test_registry();
    registry
        .register(FAILING_COMPONENT, failing_factory)
        .expect("Failed to register component type");
    let network = SimNetwork::new().with_registry(registry);
    network.place(FAILING_COMPONENT, ManagerId::new(1));
    let mut managers = spawn_managers(&network, 2);
    let (recorder, handle) = RecordingListener::handle();
    let requester =
        request_from(&mut managers[0], FAILING_COMPONENT, Some(&handle)).expect("Request failed");
    network.run_until_idle(&mut managers);

    let request = ping(3);
    let request_id = request.id;
    managers[0]
        .channel(requester)
        .unwrap()
        .send(request, SendFlags::NONE)
        .expect("Failed to send");
    network.run_until_idle(&mut managers);

    let recorder = recorder.borrow();
    let report = recorder.last().expect("No status report received");
    assert_eq!(report.message_type, MessageType::StatusReport);
    assert_eq!(report.correlation_id, Some(request_id));
    let body: StatusReport = report.decode().unwrap();
    assert_eq!(body.code, StatusCode::Handler);
    assert_eq!(body.failed_type, MessageType::domain("ping"));
    assert!(body.detail.contains("rejected"));
}

/// Test: An inbox bound from configuration refuses overflowing deliveries
#[test]
fn test_configured_inbox_capacity() {
    let network = test_network();
    let config = ManagerConfig::from_json(r#"{ "manager_id": 1, "inbox_capacity": 1 }"#)
        .expect("Failed to parse config");
    let mut managers = vec![
        network.manager(ManagerConfig::new(ManagerId::INITIAL)),
        network.manager(config),
    ];
    let (recorder, handle) = RecordingListener::handle();
    managers[1].add_listener(&handle);

    let target = managers[1].address();
    for value in 0..2 {
        managers[0]
            .send(ping(value).with_destination(target), SendFlags::NONE)
            .unwrap();
    }
    network.run_until_idle(&mut managers);

    assert_eq!(recorder.borrow().count(), 1);
    assert!(ManagerConfig::from_json("{ not json").is_err());
}
