//! §4.G: the `await`/`awaitTimeout` client-side helper built over the
//! subscription engine's replay-on-subscribe rule, so it's correct whether
//! the registration happened before or after the subscribe call.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::AwaitError;
use crate::event::{EventMask, KeyUpdateEvent};
use crate::handle::{Addressable, RegistryHandle};
use crate::key::{Key, Keyable};
use crate::pid::{Pid, Supervisor};

/// Outcome of a successful `await`: the key became registered, to `pid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredName<K> {
    pub identity: K,
    pub owner: Pid,
}

/// Block until `key_id` is registered, or until the registry itself
/// becomes unreachable. Never returns `Timeout` — use
/// [`await_registered_timeout`] for a bounded wait.
pub async fn await_registered<K, S, A>(
    registry: &A,
    caller: Pid,
    key_id: K,
) -> Result<RegisteredName<K>, AwaitError>
where
    K: Keyable,
    S: Supervisor,
    A: Addressable<K, S>,
{
    let registry = registry.resolve().ok_or(AwaitError::Disconnected)?;

    let mut mask = HashSet::new();
    mask.insert(EventMask::OnRegistered);

    let mut subscription = registry
        .monitor(caller, Key::alias_lookup(key_id.clone()), Some(mask))
        .await?;

    let supervisor = registry.supervisor().clone();
    let registry_pid = registry.pid();

    tokio::select! {
        notification = subscription.notifications.recv() => {
            match notification {
                Some(n) => match n.event {
                    KeyUpdateEvent::Registered(owner) => Ok(RegisteredName { identity: n.identity, owner }),
                    _ => unreachable!("subscription mask only admits Registered events"),
                },
                None => Err(AwaitError::Disconnected),
            }
        }
        reason = supervisor.monitor(registry_pid) => Err(AwaitError::ServerUnreachable(reason)),
    }
}

/// As [`await_registered`], but bounded by `delay`.
pub async fn await_registered_timeout<K, S, A>(
    registry: &A,
    caller: Pid,
    key_id: K,
    delay: Duration,
) -> Result<RegisteredName<K>, AwaitError>
where
    K: Keyable,
    S: Supervisor,
    A: Addressable<K, S>,
{
    match tokio::time::timeout(delay, await_registered(registry, caller, key_id)).await {
        Ok(result) => result,
        Err(_elapsed) => Err(AwaitError::Timeout),
    }
}
