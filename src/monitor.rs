//! Monitor references and the per-subscriber notification channel (§3, §4.E).

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::event::{EventMask, KeyUpdateEvent};
use crate::key::Keyable;
use crate::pid::Pid;

/// Opaque handle returned by `monitor`, unique across the registry's
/// lifetime (§3 invariant 3: backed by a strictly-increasing counter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorRef {
    pub subscriber: Pid,
    pub(crate) id: u64,
}

/// A notification fanned out to a subscriber when a watched key changes.
#[derive(Debug, Clone)]
pub struct Notification<K: Keyable> {
    pub identity: K,
    pub mref: MonitorRef,
    pub event: KeyUpdateEvent,
}

/// Internal per-subscription record kept in the registry's `monitors` table.
///
/// `mask: None` means "receive every event"; `Some(set)` filters to events
/// whose mask (via [`crate::event::mask_for`]) is a member of `set`.
pub(crate) struct KMRef<K: Keyable> {
    pub mref: MonitorRef,
    pub mask: Option<std::collections::HashSet<EventMask>>,
    pub sender: mpsc::UnboundedSender<Notification<K>>,
}

impl<K: Keyable> KMRef<K> {
    pub(crate) fn wants(&self, event: &KeyUpdateEvent) -> bool {
        match &self.mask {
            None => true,
            Some(set) => set.contains(&crate::event::mask_for(event)),
        }
    }

    pub(crate) fn deliver(&self, identity: K, event: KeyUpdateEvent) {
        let _ = self.sender.send(Notification {
            identity,
            mref: self.mref,
            event,
        });
    }
}

/// A live subscription: a [`MonitorRef`] plus the receiving end of the
/// notification channel supplied to `monitor`.
pub struct Subscription<K: Keyable> {
    pub mref: MonitorRef,
    pub notifications: mpsc::UnboundedReceiver<Notification<K>>,
}
