//! Client-visible error taxonomy (§7). Domain outcomes that are expected,
//! frequent results (`AlreadyRegistered`, `UnregisterKeyNotFound`, ...) are
//! modeled as plain enum variants returned on the `Ok` side in
//! [`crate::state`], not as errors. What lands here is the transport- and
//! liveness-level failure surface: the mailbox can be gone, or the key kind
//! the caller asked for was never wired up.

use thiserror::Error;

use crate::pid::DeathReason;

/// Failure of a call to the registry actor itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The actor's mailbox is gone: the task has stopped and no reply will
    /// ever arrive. Analogous to an IPC-closed error in a client talking to
    /// a long-running service actor.
    #[error("registry actor is no longer running")]
    Disconnected,

    /// Property keys are accepted at the API boundary (§1 Non-goals) but no
    /// handler stores them; this is the typed stand-in for that gap rather
    /// than silently misbehaving.
    #[error("property storage is not implemented")]
    PropertiesUnsupported,

    /// The dispatcher's precondition for this request wasn't met (wrong key
    /// kind, or an alias register/unregister with no owning scope). §7
    /// describes the source behavior as leaving the message unhandled so
    /// the caller observes a timeout; a typed error is the idiomatic Rust
    /// rendering of that same "never going to succeed" outcome.
    #[error("request failed a dispatch precondition")]
    InvalidRequest,
}

/// Failure of the `await`/`awaitTimeout` client helper (§4.G).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AwaitError {
    /// The registry's own liveness monitor fired before the key was
    /// registered.
    #[error("registry became unreachable: {0}")]
    ServerUnreachable(DeathReason),

    /// `awaitTimeout`'s delay elapsed first.
    #[error("timed out waiting for key to be registered")]
    Timeout,

    /// The registry's mailbox was already gone before we could even
    /// subscribe.
    #[error("registry actor is no longer running")]
    Disconnected,
}

impl From<ClientError> for AwaitError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Disconnected => AwaitError::Disconnected,
            ClientError::PropertiesUnsupported | ClientError::InvalidRequest => {
                unreachable!("await always monitors a well-formed alias lookup key")
            }
        }
    }
}
