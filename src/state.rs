//! State tables (§3) and the registration/subscription/reaper engines
//! (§4.D, §4.E, §4.F). Owned exclusively by the registry actor (§5): no
//! method here is `async` or takes a lock, because nothing outside the
//! actor task ever sees a `&mut RegistryState`.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::event::{EventMask, KeyUpdateEvent};
use crate::key::Keyable;
use crate::monitor::{KMRef, MonitorRef, Notification};
use crate::pid::{DeathReason, Pid};

/// Result of `register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    RegisteredOk,
    AlreadyRegistered,
}

/// Result of `unregister`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnregisterOutcome {
    UnregisterOk,
    UnregisterInvalidKey,
    UnregisterKeyNotFound,
}

/// Whether the caller just became an owner or subscriber for the first
/// time and therefore needs a liveness monitor installed. The state layer
/// reports this back to the actor rather than installing the monitor
/// itself, since spawning the watch task needs the async supervisor the
/// pure state doesn't have access to (§5: handlers are non-blocking).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeedsWatch(pub Option<Pid>);

pub(crate) struct RegistryState<K: Keyable> {
    names: HashMap<K, Pid>,
    // Property storage is deferred (§1 Non-goals); the table exists so the
    // shape matches the full key taxonomy and a future implementation has
    // a slot, but nothing ever inserts into it.
    properties: HashMap<(Pid, K), ()>,
    monitors: HashMap<K, Vec<KMRef<K>>>,
    registered_pids: HashSet<Pid>,
    listening_pids: HashSet<Pid>,
    monitor_id_count: u64,
}

impl<K: Keyable> RegistryState<K> {
    pub(crate) fn new() -> Self {
        RegistryState {
            names: HashMap::new(),
            properties: HashMap::new(),
            monitors: HashMap::new(),
            registered_pids: HashSet::new(),
            listening_pids: HashSet::new(),
            monitor_id_count: 1,
        }
    }

    fn notify(&self, identity: &K, event: KeyUpdateEvent) {
        let Some(kmrefs) = self.monitors.get(identity) else {
            return;
        };
        for kmref in kmrefs {
            if kmref.wants(&event) {
                kmref.deliver(identity.clone(), event.clone());
            }
        }
    }

    /// §4.D `register`. Returns the outcome plus a pid to start watching, if
    /// this is the first time `owner` has registered anything.
    pub(crate) fn register(&mut self, identity: K, owner: Pid) -> (RegisterOutcome, NeedsWatch) {
        match self.names.get(&identity) {
            Some(existing) if *existing == owner => {
                debug!(?identity, ?owner, "register: idempotent, already owner");
                (RegisterOutcome::RegisteredOk, NeedsWatch(None))
            }
            Some(_other) => {
                debug!(?identity, ?owner, "register: already registered by another owner");
                (RegisterOutcome::AlreadyRegistered, NeedsWatch(None))
            }
            None => {
                let needs_watch = self.registered_pids.insert(owner);
                self.names.insert(identity.clone(), owner);
                info!(?identity, ?owner, "registered");
                self.notify(&identity, KeyUpdateEvent::Registered(owner));
                (
                    RegisterOutcome::RegisteredOk,
                    NeedsWatch(needs_watch.then_some(owner)),
                )
            }
        }
    }

    /// §4.D `unregister`. Retains subscriptions whose mask includes
    /// `OnRegistered` rather than purging the whole entry (see DESIGN.md).
    pub(crate) fn unregister(&mut self, identity: K, caller: Pid) -> UnregisterOutcome {
        match self.names.get(&identity) {
            None => UnregisterOutcome::UnregisterKeyNotFound,
            Some(owner) if *owner != caller => UnregisterOutcome::UnregisterInvalidKey,
            Some(_) => {
                self.notify(&identity, KeyUpdateEvent::Unregistered);
                self.names.remove(&identity);
                if let Some(kmrefs) = self.monitors.get_mut(&identity) {
                    kmrefs.retain(|kmref| {
                        kmref
                            .mask
                            .as_ref()
                            .is_none_or(|set| set.contains(&EventMask::OnRegistered))
                    });
                    if kmrefs.is_empty() {
                        self.monitors.remove(&identity);
                    }
                }
                info!(?identity, owner = ?caller, "unregistered");
                UnregisterOutcome::UnregisterOk
            }
        }
    }

    pub(crate) fn lookup(&self, identity: &K) -> Option<Pid> {
        self.names.get(identity).copied()
    }

    pub(crate) fn registered_names(&self, owner: Pid) -> Vec<K> {
        self.names
            .iter()
            .filter(|(_, p)| **p == owner)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// §4.D `foldNames`: a consistent point-in-time snapshot of the whole
    /// name table, taken under the actor's single-writer boundary.
    pub(crate) fn snapshot_names(&self) -> Vec<(K, Pid)> {
        self.names.iter().map(|(k, p)| (k.clone(), *p)).collect()
    }

    /// §4.E `monitor`. `notify_tx` is the channel the subscriber supplied
    /// to receive `Notification`s; replay-on-subscribe sends directly on it
    /// before this returns, per §5's ordering guarantee that replay
    /// precedes any later event for the same key.
    pub(crate) fn monitor(
        &mut self,
        identity: K,
        scope: Option<Pid>,
        mask: Option<HashSet<EventMask>>,
        subscriber: Pid,
        notify_tx: tokio::sync::mpsc::UnboundedSender<Notification<K>>,
    ) -> (MonitorRef, NeedsWatch) {
        self.monitor_id_count += 1;
        let mref = MonitorRef {
            subscriber,
            id: self.monitor_id_count,
        };

        let wants_registered = mask
            .as_ref()
            .is_none_or(|set| set.contains(&EventMask::OnRegistered));

        if wants_registered {
            if let Some(owner) = self.names.get(&identity) {
                let _ = notify_tx.send(Notification {
                    identity: identity.clone(),
                    mref,
                    event: KeyUpdateEvent::Registered(*owner),
                });
            } else if scope.is_some() {
                // Property replay: deferred along with property storage
                // itself (§9 "Property scope fallback"). Nothing to replay.
                warn!(?identity, "monitor: property replay requested but properties are unimplemented");
            }
        }

        let needs_watch = self.listening_pids.insert(subscriber);
        self.monitors.entry(identity).or_default().push(KMRef {
            mref,
            mask,
            sender: notify_tx,
        });

        (mref, NeedsWatch(needs_watch.then_some(subscriber)))
    }

    /// §4.F liveness reaper, invoked once per `ProcessDown(pid, reason)`.
    pub(crate) fn reap(&mut self, pid: Pid, reason: DeathReason) {
        // Step 1: subscriber cleanup.
        self.listening_pids.remove(&pid);
        for kmrefs in self.monitors.values_mut() {
            kmrefs.retain(|kmref| kmref.mref.subscriber != pid);
        }
        self.monitors.retain(|_, v| !v.is_empty());

        // Step 2: owner cleanup — names.
        let died_names: Vec<K> = self
            .names
            .iter()
            .filter(|(_, owner)| **owner == pid)
            .map(|(k, _)| k.clone())
            .collect();

        for identity in &died_names {
            if let Some(kmrefs) = self.monitors.get(identity) {
                for kmref in kmrefs {
                    if kmref.mask.is_none()
                        || kmref
                            .mask
                            .as_ref()
                            .is_some_and(|set| set.contains(&EventMask::OnOwnershipChange))
                    {
                        kmref.deliver(identity.clone(), KeyUpdateEvent::OwnerDied(reason.clone()));
                    } else if kmref
                        .mask
                        .as_ref()
                        .is_some_and(|set| set.contains(&EventMask::OnUnregistered))
                    {
                        kmref.deliver(identity.clone(), KeyUpdateEvent::Unregistered);
                    }
                }
            }
            self.names.remove(identity);
        }

        // Step 2 (cont'd): owner cleanup — properties. Deferred storage, so
        // this is just table hygiene; nothing is ever actually present.
        self.properties.retain(|(owner, _), ()| *owner != pid);

        self.registered_pids.remove(&pid);

        if !died_names.is_empty() {
            info!(?pid, ?reason, count = died_names.len(), "reaped dead owner");
        } else {
            debug!(?pid, ?reason, "reaped dead process with nothing owned");
        }
    }
}
