//! An in-memory process registry: keyed aliases with single ownership,
//! optional properties, and subscription-based lifecycle notifications,
//! run as a single-writer actor so the name table never needs a lock.
//!
//! The actor ([`actor::RegistryActor`]) owns all registry state and is
//! driven entirely by messages: client requests arrive over an `mpsc`
//! channel, and process-death notifications arrive over an internal
//! unbounded channel that always wins a simultaneous wakeup. Clients never
//! see the actor directly — they hold a [`RegistryHandle`], a cheap
//! cloneable reference modeled the same way this codebase's IPC service
//! handles are: a mailbox sender plus whatever bookkeeping a call needs to
//! wait on a reply.
//!
//! Liveness is abstracted behind [`Supervisor`] so the registry doesn't
//! hardcode a particular process runtime; [`LocalSupervisor`] is the
//! in-process implementation used by tests and single-node embedders.

mod actor;
mod await_primitive;
mod error;
mod event;
mod handle;
mod key;
mod messages;
mod monitor;
mod pid;
mod state;

pub use await_primitive::{await_registered, await_registered_timeout, RegisteredName};
pub use error::{AwaitError, ClientError};
pub use event::{mask_for, EventMask, KeyUpdateEvent};
pub use handle::{Addressable, RegistryHandle};
pub use key::{Key, KeyKind, Keyable};
pub use monitor::{MonitorRef, Notification, Subscription};
pub use pid::{DeathReason, LocalSupervisor, Pid, Supervisor};
pub use state::{RegisterOutcome, UnregisterOutcome};
