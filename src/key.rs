//! The key model (§4.A): identities plus the `Keyable` capability bundle.

use std::fmt;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::pid::Pid;

/// Capability bundle required of anything used as a key identity: equatable,
/// hashable, serializable, and printable for diagnostics. Blanket-implemented
/// for any type that already satisfies the bound, so callers never implement
/// it by hand.
pub trait Keyable:
    Clone + Eq + Hash + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
}

impl<T> Keyable for T where
    T: Clone + Eq + Hash + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
}

/// Whether a key is a globally-unique alias or a per-process property.
///
/// Property storage is deferred (see crate docs); the variant exists so the
/// wire shape matches the full taxonomy and so `Key` construction can be
/// rejected at the boundary with a typed error rather than silently doing
/// the wrong thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyKind {
    Alias,
    Property,
}

/// A key: an identity, its kind, and an optional owning scope.
///
/// `scope` names the owner at registration/unregistration time and is
/// `None` on pure lookups or when awaiting a not-yet-registered alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key<K: Keyable> {
    pub identity: K,
    pub kind: KeyKind,
    pub scope: Option<Pid>,
}

impl<K: Keyable> Key<K> {
    /// An alias key owned by `owner`, suitable for `register`/`unregister`.
    pub fn alias(identity: K, owner: Pid) -> Self {
        Key {
            identity,
            kind: KeyKind::Alias,
            scope: Some(owner),
        }
    }

    /// An alias key with no owner, suitable for `lookup` and for `monitor`
    /// when awaiting a key that may not be registered yet.
    pub fn alias_lookup(identity: K) -> Self {
        Key {
            identity,
            kind: KeyKind::Alias,
            scope: None,
        }
    }

    /// A property key scoped to `owner`. Accepted at the API boundary but
    /// rejected by every handler: property storage is deferred.
    pub fn property(identity: K, owner: Pid) -> Self {
        Key {
            identity,
            kind: KeyKind::Property,
            scope: Some(owner),
        }
    }
}

impl<K: Keyable + fmt::Display> fmt::Display for Key<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            KeyKind::Alias => write!(f, "alias({})", self.identity),
            KeyKind::Property => write!(f, "property({})", self.identity),
        }
    }
}
