//! Inbound message families the dispatcher demultiplexes (§4.C).

use std::collections::HashSet;

use tokio::sync::{mpsc, oneshot};

use crate::event::EventMask;
use crate::key::Key;
use crate::key::Keyable;
use crate::monitor::{MonitorRef, Notification};
use crate::pid::{DeathReason, Pid};
use crate::state::{RegisterOutcome, UnregisterOutcome};

/// The six client-facing request families, plus the internal `ProcessDown`
/// the dispatcher gives strictly higher priority (§4.C, §5).
pub(crate) enum Command<K: Keyable> {
    Register {
        key: Key<K>,
        reply: oneshot::Sender<Result<RegisterOutcome, crate::error::ClientError>>,
    },
    Unregister {
        key: Key<K>,
        reply: oneshot::Sender<Result<UnregisterOutcome, crate::error::ClientError>>,
    },
    Lookup {
        key: Key<K>,
        reply: oneshot::Sender<Option<Pid>>,
    },
    RegisteredNames {
        owner: Pid,
        reply: oneshot::Sender<Vec<K>>,
    },
    Monitor {
        key: Key<K>,
        mask: Option<HashSet<EventMask>>,
        subscriber: Pid,
        notify_tx: mpsc::UnboundedSender<Notification<K>>,
        reply: oneshot::Sender<Result<MonitorRef, crate::error::ClientError>>,
    },
    /// `QueryDirect`/snapshot cast (§6): used by `foldNames`.
    Snapshot {
        reply: oneshot::Sender<Vec<(K, Pid)>>,
    },
}

/// The runtime's liveness signal (§6), processed ahead of every `Command`.
pub(crate) struct ProcessDown {
    pub pid: Pid,
    pub reason: DeathReason,
}
