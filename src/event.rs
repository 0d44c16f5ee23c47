//! Lifecycle events and the masks subscribers filter them by (§3, §4.E).

use serde::{Deserialize, Serialize};

use crate::pid::{DeathReason, Pid};

/// The four event masks a subscriber may filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventMask {
    OnRegistered,
    OnUnregistered,
    OnOwnershipChange,
    OnLeaseExpiry,
}

/// A state change to a watched key.
///
/// `OwnerDied` and `OwnerChanged` both fold to [`EventMask::OnOwnershipChange`]
/// via [`mask_for`]; `LeaseExpired` exists in the taxonomy but nothing in
/// this crate ever produces it (no lease-expiry timer is implemented).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyUpdateEvent {
    Registered(Pid),
    Unregistered,
    LeaseExpired,
    OwnerDied(DeathReason),
    OwnerChanged(Pid, Pid),
}

/// Total mapping from every event constructor to its mask.
pub fn mask_for(event: &KeyUpdateEvent) -> EventMask {
    match event {
        KeyUpdateEvent::Registered(_) => EventMask::OnRegistered,
        KeyUpdateEvent::Unregistered => EventMask::OnUnregistered,
        KeyUpdateEvent::LeaseExpired => EventMask::OnLeaseExpiry,
        KeyUpdateEvent::OwnerDied(_) => EventMask::OnOwnershipChange,
        KeyUpdateEvent::OwnerChanged(_, _) => EventMask::OnOwnershipChange,
    }
}
