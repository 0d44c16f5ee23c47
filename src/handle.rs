//! Public client API (§6): `RegistryHandle` is the cloneable mailbox
//! reference clients hold. Every method sends a [`Command`] and awaits its
//! reply, the same shape as this codebase's `CtlrTx` / `ControllerRequest`
//! pattern — an `mpsc` request channel paired with a `oneshot` reply per
//! call.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::instrument;

use crate::actor::RegistryActor;
use crate::error::ClientError;
use crate::event::EventMask;
use crate::key::{Key, Keyable};
use crate::messages::Command;
use crate::monitor::{MonitorRef, Subscription};
use crate::pid::{Pid, Supervisor};
use crate::state::{RegisterOutcome, UnregisterOutcome};

/// How many in-flight requests the registry's mailbox buffers before a
/// sender has to wait. Chosen the way this codebase chooses such constants:
/// generously, since backpressure here just means a slow registry, not data
/// loss.
const MAILBOX_CAPACITY: usize = 1024;

/// A cloneable reference to a running registry actor.
///
/// `K` is the application's key identity type; `S` is the liveness
/// supervisor, defaulting to [`crate::pid::LocalSupervisor`].
pub struct RegistryHandle<K: Keyable, S: Supervisor = crate::pid::LocalSupervisor> {
    cmd_tx: mpsc::Sender<Command<K>>,
    registry_pid: Pid,
    supervisor: Arc<S>,
}

impl<K: Keyable, S: Supervisor> Clone for RegistryHandle<K, S> {
    fn clone(&self) -> Self {
        RegistryHandle {
            cmd_tx: self.cmd_tx.clone(),
            registry_pid: self.registry_pid,
            supervisor: Arc::clone(&self.supervisor),
        }
    }
}

/// Anything that can be resolved to a running registry. Reified per §9's
/// "Addressability" design note; for this crate resolution is infallible
/// once you already hold a handle, but the capability is still named so an
/// embedder routing through opaque addresses has a seam to implement.
pub trait Addressable<K: Keyable, S: Supervisor> {
    fn resolve(&self) -> Option<RegistryHandle<K, S>>;
}

impl<K: Keyable, S: Supervisor> Addressable<K, S> for RegistryHandle<K, S> {
    fn resolve(&self) -> Option<RegistryHandle<K, S>> {
        Some(self.clone())
    }
}

impl<K: Keyable, S: Supervisor> RegistryHandle<K, S> {
    /// `start(registry)` (§6): spawn the actor task and return a handle to
    /// it. Fatal if the task can't be spawned at all, which on `tokio`
    /// effectively never happens outside of runtime shutdown.
    pub fn spawn(supervisor: Arc<S>) -> RegistryHandle<K, S> {
        let registry_pid = supervisor.alloc_pid();
        let (cmd_tx, cmd_rx) = mpsc::channel(MAILBOX_CAPACITY);
        let actor = RegistryActor::new(registry_pid, Arc::clone(&supervisor), cmd_rx);

        let sup_for_exit = Arc::clone(&supervisor);
        tokio::spawn(async move {
            let result = tokio::spawn(actor.run()).await;
            let reason = match result {
                Ok(()) => crate::pid::DeathReason::Normal,
                Err(join_err) => crate::pid::DeathReason::Exception(join_err.to_string()),
            };
            sup_for_exit.kill(registry_pid, reason);
        });

        RegistryHandle {
            cmd_tx,
            registry_pid,
            supervisor,
        }
    }

    /// The registry actor's own pid, used to install a liveness watch on it
    /// (§4.G step 2).
    pub fn pid(&self) -> Pid {
        self.registry_pid
    }

    pub fn supervisor(&self) -> &Arc<S> {
        &self.supervisor
    }

    async fn call<Req, Resp>(
        &self,
        build: impl FnOnce(oneshot::Sender<Resp>) -> Req,
        to_command: impl FnOnce(Req) -> Command<K>,
    ) -> Result<Resp, ClientError>
    where
        Resp: Send,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let req = build(reply_tx);
        self.cmd_tx
            .send(to_command(req))
            .await
            .map_err(|_| ClientError::Disconnected)?;
        reply_rx.await.map_err(|_| ClientError::Disconnected)
    }

    /// `registerName(reg, k, owner)`: register `key_id` as an alias owned
    /// by `owner`.
    #[instrument(skip(self))]
    pub async fn register_name(
        &self,
        key_id: K,
        owner: Pid,
    ) -> Result<RegisterOutcome, ClientError> {
        let key = Key::alias(key_id, owner);
        self.call(
            |reply| (key.clone(), reply),
            |(key, reply)| Command::Register { key, reply },
        )
        .await?
    }

    /// `addName(reg, k)`: sugar for `register_name` where the caller
    /// registers a name for itself.
    pub async fn add_name(&self, caller: Pid, key_id: K) -> Result<RegisterOutcome, ClientError> {
        self.register_name(key_id, caller).await
    }

    /// `unregisterName(reg, k)`.
    pub async fn unregister_name(
        &self,
        caller: Pid,
        key_id: K,
    ) -> Result<UnregisterOutcome, ClientError> {
        let key = Key::alias(key_id, caller);
        self.call(
            |reply| (key.clone(), reply),
            |(key, reply)| Command::Unregister { key, reply },
        )
        .await?
    }

    /// `lookupName(reg, k)`.
    pub async fn lookup_name(&self, key_id: K) -> Result<Option<Pid>, ClientError> {
        let key = Key::alias_lookup(key_id);
        self.call(
            |reply| (key.clone(), reply),
            |(key, reply)| Command::Lookup { key, reply },
        )
        .await
    }

    /// `registeredNames(reg, pid)`.
    pub async fn registered_names(&self, owner: Pid) -> Result<Vec<K>, ClientError> {
        self.call(
            |reply| reply,
            |reply| Command::RegisteredNames { owner, reply },
        )
        .await
    }

    /// `foldNames(reg, seed, f)`: fetch a consistent snapshot of the whole
    /// name table and fold it locally.
    pub async fn fold_names<B>(
        &self,
        init: B,
        mut f: impl FnMut(B, &K, Pid) -> B,
    ) -> Result<B, ClientError> {
        let snapshot = self.call(|reply| reply, |reply| Command::Snapshot { reply }).await?;
        Ok(snapshot
            .into_iter()
            .fold(init, |acc, (k, p)| f(acc, &k, p)))
    }

    /// `monitor(reg, key, mask)`: subscribe to lifecycle events for an
    /// arbitrary key (alias or, at the interface layer, property — though
    /// the latter always yields [`ClientError::PropertiesUnsupported`]).
    pub async fn monitor(
        &self,
        caller: Pid,
        key: Key<K>,
        mask: Option<HashSet<EventMask>>,
    ) -> Result<Subscription<K>, ClientError> {
        let (notify_tx, notifications) = mpsc::unbounded_channel();
        let mref: MonitorRef = self
            .call(
                |reply| (key, mask, notify_tx, reply),
                |(key, mask, notify_tx, reply)| Command::Monitor {
                    key,
                    mask,
                    subscriber: caller,
                    notify_tx,
                    reply,
                },
            )
            .await??;
        Ok(Subscription {
            mref,
            notifications,
        })
    }

    /// `monitorName(reg, k)`: sugar for watching every event on an alias
    /// key.
    pub async fn monitor_name(
        &self,
        caller: Pid,
        key_id: K,
    ) -> Result<Subscription<K>, ClientError> {
        self.monitor(caller, Key::alias_lookup(key_id), None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pid::LocalSupervisor;

    /// A handle whose actor was dropped without ever running (the mailbox
    /// receiver is gone) reports `Disconnected` instead of hanging.
    #[tokio::test]
    async fn call_on_a_handle_whose_actor_never_ran_reports_disconnected() {
        let supervisor = LocalSupervisor::new();
        let registry_pid = supervisor.alloc_pid();
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command<String>>(MAILBOX_CAPACITY);

        // Build the actor but never spawn its `run()` loop; dropping it here
        // drops `cmd_rx` with it, the same as if the task had been aborted.
        drop(RegistryActor::new(registry_pid, supervisor.clone(), cmd_rx));

        let handle: RegistryHandle<String> = RegistryHandle {
            cmd_tx,
            registry_pid,
            supervisor,
        };

        let result = handle.lookup_name("anything".to_string()).await;
        assert_eq!(result, Err(ClientError::Disconnected));
    }
}
