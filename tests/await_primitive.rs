//! `await`/`awaitTimeout` (§4.G): blocking until a key is registered, with
//! both the "already there" and "becomes there" paths, plus the timeout and
//! server-unreachable failure modes.

use std::time::Duration;

use process_registry::{await_registered, await_registered_timeout, AwaitError, LocalSupervisor, RegistryHandle};

#[tokio::test]
async fn await_resolves_immediately_if_already_registered() {
    let supervisor = LocalSupervisor::new();
    let registry: RegistryHandle<String> = RegistryHandle::spawn(supervisor.clone());
    let alice = supervisor.alloc_pid();
    let waiter = supervisor.alloc_pid();

    registry.add_name(alice, "ready".to_string()).await.unwrap();

    let result = await_registered(&registry, waiter, "ready".to_string()).await.unwrap();
    assert_eq!(result.identity, "ready");
    assert_eq!(result.owner, alice);
}

#[tokio::test]
async fn await_resolves_once_a_later_registration_happens() {
    let supervisor = LocalSupervisor::new();
    let registry: RegistryHandle<String> = RegistryHandle::spawn(supervisor.clone());
    let alice = supervisor.alloc_pid();
    let waiter = supervisor.alloc_pid();

    let registry_clone = registry.clone();
    let waiting = tokio::spawn(async move {
        await_registered(&registry_clone, waiter, "eventual".to_string()).await
    });

    tokio::task::yield_now().await;
    registry.add_name(alice, "eventual".to_string()).await.unwrap();

    let result = waiting.await.unwrap().unwrap();
    assert_eq!(result.owner, alice);
}

#[tokio::test]
async fn await_timeout_elapses_if_nobody_registers() {
    let supervisor = LocalSupervisor::new();
    let registry: RegistryHandle<String> = RegistryHandle::spawn(supervisor.clone());
    let waiter = supervisor.alloc_pid();

    let result = await_registered_timeout(
        &registry,
        waiter,
        "never-comes".to_string(),
        Duration::from_millis(50),
    )
    .await;
    assert_eq!(result, Err(AwaitError::Timeout));
}

#[tokio::test]
async fn await_reports_server_unreachable_if_registry_dies_first() {
    let supervisor = LocalSupervisor::new();
    let registry: RegistryHandle<String> = RegistryHandle::spawn(supervisor.clone());
    let waiter = supervisor.alloc_pid();
    let registry_pid = registry.pid();

    let registry_clone = registry.clone();
    let waiting = tokio::spawn(async move {
        await_registered(&registry_clone, waiter, "nope".to_string()).await
    });

    tokio::task::yield_now().await;
    supervisor.kill(registry_pid, process_registry::DeathReason::Killed("shutdown".into()));

    let result = waiting.await.unwrap();
    assert!(matches!(result, Err(AwaitError::ServerUnreachable(_))));
}
