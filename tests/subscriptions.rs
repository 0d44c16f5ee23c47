//! Subscription/notification behavior through the public handle:
//! replay-on-subscribe, mask filtering, and ownership-change fan-out.

use std::collections::HashSet;
use std::time::Duration;

use process_registry::{EventMask, KeyUpdateEvent, LocalSupervisor, RegistryHandle};

#[tokio::test]
async fn monitor_before_registration_then_registering_delivers_one_event() {
    let supervisor = LocalSupervisor::new();
    let registry: RegistryHandle<String> = RegistryHandle::spawn(supervisor.clone());
    let alice = supervisor.alloc_pid();
    let watcher = supervisor.alloc_pid();

    let mut subscription = registry
        .monitor_name(watcher, "late-bloomer".to_string())
        .await
        .unwrap();

    registry.add_name(alice, "late-bloomer".to_string()).await.unwrap();

    let notification = tokio::time::timeout(Duration::from_secs(1), subscription.notifications.recv())
        .await
        .expect("notification should arrive")
        .expect("channel should not close");

    assert_eq!(notification.identity, "late-bloomer");
    assert!(matches!(notification.event, KeyUpdateEvent::Registered(p) if p == alice));
}

#[tokio::test]
async fn monitor_after_registration_replays_immediately() {
    let supervisor = LocalSupervisor::new();
    let registry: RegistryHandle<String> = RegistryHandle::spawn(supervisor.clone());
    let alice = supervisor.alloc_pid();
    let watcher = supervisor.alloc_pid();

    registry.add_name(alice, "early-bird".to_string()).await.unwrap();

    let mut subscription = registry
        .monitor_name(watcher, "early-bird".to_string())
        .await
        .unwrap();

    let notification = tokio::time::timeout(Duration::from_secs(1), subscription.notifications.recv())
        .await
        .expect("replay should arrive without a new register")
        .expect("channel should not close");

    assert!(matches!(notification.event, KeyUpdateEvent::Registered(p) if p == alice));
}

#[tokio::test]
async fn mask_filters_out_unwanted_events() {
    let supervisor = LocalSupervisor::new();
    let registry: RegistryHandle<String> = RegistryHandle::spawn(supervisor.clone());
    let alice = supervisor.alloc_pid();
    let watcher = supervisor.alloc_pid();

    registry.add_name(alice, "quiet".to_string()).await.unwrap();

    let mut mask = HashSet::new();
    mask.insert(EventMask::OnUnregistered);
    let mut subscription = registry
        .monitor(watcher, process_registry::Key::alias_lookup("quiet".to_string()), Some(mask))
        .await
        .unwrap();

    // No `OnRegistered` replay, since the mask excludes it.
    assert!(subscription.notifications.try_recv().is_err());

    registry.unregister_name(alice, "quiet".to_string()).await.unwrap();
    let notification = tokio::time::timeout(Duration::from_secs(1), subscription.notifications.recv())
        .await
        .expect("unregister notification should arrive")
        .expect("channel should not close");
    assert!(matches!(notification.event, KeyUpdateEvent::Unregistered));
}

#[tokio::test]
async fn distinct_monitor_refs_for_repeated_subscriptions() {
    let supervisor = LocalSupervisor::new();
    let registry: RegistryHandle<String> = RegistryHandle::spawn(supervisor.clone());
    let watcher = supervisor.alloc_pid();

    let s1 = registry.monitor_name(watcher, "k".to_string()).await.unwrap();
    let s2 = registry.monitor_name(watcher, "k".to_string()).await.unwrap();
    assert_ne!(s1.mref, s2.mref);
}
