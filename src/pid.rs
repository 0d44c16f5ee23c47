//! Process identity and liveness monitoring.
//!
//! The registry core (§6 of the design doc) only requires that its host
//! runtime supply an equatable, hashable, serializable `ProcessId` and a
//! `monitor(pid)` primitive that eventually resolves with a death reason.
//! [`LocalSupervisor`] is the concrete realization of that contract used by
//! this crate and by its own tests: processes are just allocated ids, and
//! death is whatever the allocator is told to report via [`LocalSupervisor::kill`]
//! or, for the registry's own actor task, whatever its `tokio` task returned.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Opaque process identity. Equatable, hashable, serializable, `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pid(u64);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

#[cfg(test)]
impl Pid {
    pub(crate) fn for_test(id: u64) -> Pid {
        Pid(id)
    }
}

/// Why a monitored process terminated.
///
/// Mirrors the structured exit reasons a real actor runtime's supervision
/// tree would report alongside a `ProcessDown` signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathReason {
    Normal,
    Killed(String),
    Exception(String),
    NodeDisconnected,
}

impl fmt::Display for DeathReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeathReason::Normal => write!(f, "normal exit"),
            DeathReason::Killed(msg) => write!(f, "killed: {msg}"),
            DeathReason::Exception(msg) => write!(f, "exception: {msg}"),
            DeathReason::NodeDisconnected => write!(f, "node disconnected"),
        }
    }
}

/// The host-runtime liveness contract the registry actor depends on.
///
/// Generic over the supervisor so an embedder with a real distributed actor
/// runtime can supply their own implementation; [`LocalSupervisor`] is the
/// one this crate ships and tests against.
pub trait Supervisor: Send + Sync + 'static {
    /// Resolve to `Some(pid)` if this handle still designates a live or
    /// known process. The default realization never invalidates a [`Pid`].
    fn resolve(&self, pid: Pid) -> Option<Pid> {
        Some(pid)
    }

    /// Await termination of `pid`. Resolves immediately with the recorded
    /// reason if `pid` is already dead.
    fn monitor(&self, pid: Pid) -> impl std::future::Future<Output = DeathReason> + Send;
}

enum Slot {
    Alive(broadcast::Sender<DeathReason>),
    Dead(DeathReason),
}

/// In-process realization of [`Supervisor`]: processes are bare allocated
/// ids, tracked in a small lock-protected table. Used both to host the
/// registry's own actor task and, in tests, to stand in for arbitrary
/// client processes.
///
/// Not a concurrent map crate on purpose: the table here is incidental
/// bookkeeping for liveness, not the registry's own single-writer state
/// (§5), so a plain `parking_lot::Mutex<HashMap<_>>` is the right tool.
pub struct LocalSupervisor {
    next: AtomicU64,
    table: Mutex<HashMap<Pid, Slot>>,
}

impl LocalSupervisor {
    pub fn new() -> Arc<Self> {
        Arc::new(LocalSupervisor {
            next: AtomicU64::new(1),
            table: Mutex::new(HashMap::new()),
        })
    }

    /// Allocate a fresh, live [`Pid`].
    pub fn alloc_pid(&self) -> Pid {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        let pid = Pid(id);
        let (tx, _rx) = broadcast::channel(1);
        self.table.lock().insert(pid, Slot::Alive(tx));
        pid
    }

    /// Mark `pid` dead with `reason`, waking every pending [`monitor`](Supervisor::monitor) call.
    /// Idempotent: killing an already-dead pid is a no-op.
    pub fn kill(&self, pid: Pid, reason: DeathReason) {
        let mut table = self.table.lock();
        if let Some(Slot::Alive(tx)) = table.get(&pid) {
            let _ = tx.send(reason.clone());
        }
        table.insert(pid, Slot::Dead(reason));
    }
}

impl Supervisor for LocalSupervisor {
    async fn monitor(&self, pid: Pid) -> DeathReason {
        let mut rx = {
            let table = self.table.lock();
            match table.get(&pid) {
                Some(Slot::Dead(reason)) => return reason.clone(),
                Some(Slot::Alive(tx)) => tx.subscribe(),
                None => return DeathReason::NodeDisconnected,
            }
        };
        match rx.recv().await {
            Ok(reason) => reason,
            // Sender dropped without ever broadcasting: the allocator itself
            // was torn down. Treat it like the other process vanished.
            Err(_) => DeathReason::NodeDisconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn monitor_resolves_on_kill() {
        let sup = LocalSupervisor::new();
        let pid = sup.alloc_pid();

        let sup2 = Arc::clone(&sup);
        let handle = tokio::spawn(async move { sup2.monitor(pid).await });

        tokio::task::yield_now().await;
        sup.kill(pid, DeathReason::Killed("boom".into()));

        let reason = handle.await.unwrap();
        assert_eq!(reason, DeathReason::Killed("boom".into()));
    }

    #[tokio::test]
    async fn monitor_on_already_dead_pid_resolves_immediately() {
        let sup = LocalSupervisor::new();
        let pid = sup.alloc_pid();
        sup.kill(pid, DeathReason::Normal);

        let reason = sup.monitor(pid).await;
        assert_eq!(reason, DeathReason::Normal);
    }

    #[test]
    fn distinct_pids_are_never_equal() {
        let sup = LocalSupervisor::new();
        let a = sup.alloc_pid();
        let b = sup.alloc_pid();
        assert_ne!(a, b);
    }
}
