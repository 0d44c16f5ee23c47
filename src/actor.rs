//! The registry actor's event loop (§2, §5): a single-consumer task that
//! dequeues one message at a time and runs its handler to completion before
//! dequeuing the next. Modeled on this codebase's controller actors, which
//! poll several inbound streams in a fixed priority order via `poll_fn`
//! rather than a plain `tokio::select!` (whose branch order is not a
//! priority guarantee across wakeups).

use std::collections::HashSet;
use std::future::poll_fn;
use std::sync::Arc;
use std::task::Poll;

use tokio::sync::{mpsc, oneshot};
use tracing::{instrument, warn};

use crate::error::ClientError;
use crate::event::EventMask;
use crate::key::{Key, KeyKind, Keyable};
use crate::messages::{Command, ProcessDown};
use crate::monitor::{MonitorRef, Notification};
use crate::pid::{Pid, Supervisor};
use crate::state::{NeedsWatch, RegisterOutcome, RegistryState, UnregisterOutcome};

enum Tick<K: Keyable> {
    Down(ProcessDown),
    Cmd(Command<K>),
}

pub(crate) struct RegistryActor<K: Keyable, S: Supervisor> {
    own_pid: Pid,
    supervisor: Arc<S>,
    state: RegistryState<K>,
    cmd_rx: mpsc::Receiver<Command<K>>,
    down_tx: mpsc::UnboundedSender<ProcessDown>,
    down_rx: mpsc::UnboundedReceiver<ProcessDown>,
    watched: HashSet<Pid>,
}

impl<K: Keyable, S: Supervisor> RegistryActor<K, S> {
    pub(crate) fn new(
        own_pid: Pid,
        supervisor: Arc<S>,
        cmd_rx: mpsc::Receiver<Command<K>>,
    ) -> Self {
        let (down_tx, down_rx) = mpsc::unbounded_channel();
        RegistryActor {
            own_pid,
            supervisor,
            state: RegistryState::new(),
            cmd_rx,
            down_tx,
            down_rx,
            watched: HashSet::new(),
        }
    }

    /// Install a liveness watch on `pid` if we don't already have one.
    /// Idempotent: a pid that is both an owner and a subscriber only ever
    /// gets one forwarding task.
    fn ensure_watched(&mut self, pid: Pid) {
        if !self.watched.insert(pid) {
            return;
        }
        let supervisor = Arc::clone(&self.supervisor);
        let down_tx = self.down_tx.clone();
        tokio::spawn(async move {
            let reason = supervisor.monitor(pid).await;
            let _ = down_tx.send(ProcessDown { pid, reason });
        });
    }

    async fn tick(&mut self) -> Option<Tick<K>> {
        poll_fn(|cx| {
            // ProcessDown always wins a simultaneous wakeup (§4.C priority
            // rule): a freshly-dead owner must be reaped before any client
            // can observe the stale binding through `lookup`.
            if let Poll::Ready(down) = self.down_rx.poll_recv(cx) {
                return Poll::Ready(down.map(Tick::Down));
            }
            if let Poll::Ready(cmd) = self.cmd_rx.poll_recv(cx) {
                return Poll::Ready(cmd.map(Tick::Cmd));
            }
            Poll::Pending
        })
        .await
    }

    #[instrument(skip_all, fields(registry = %self.own_pid))]
    pub(crate) async fn run(mut self) {
        self.ensure_watched(self.own_pid);
        while let Some(tick) = self.tick().await {
            match tick {
                Tick::Down(ProcessDown { pid, reason }) => self.state.reap(pid, reason),
                Tick::Cmd(cmd) => self.dispatch(cmd),
            }
        }
    }

    fn dispatch(&mut self, cmd: Command<K>) {
        match cmd {
            Command::Register { key, reply } => self.handle_register(key, reply),
            Command::Unregister { key, reply } => self.handle_unregister(key, reply),
            Command::Lookup { key, reply } => {
                let _ = reply.send(self.handle_lookup(key));
            }
            Command::RegisteredNames { owner, reply } => {
                let _ = reply.send(self.state.registered_names(owner));
            }
            Command::Monitor {
                key,
                mask,
                subscriber,
                notify_tx,
                reply,
            } => self.handle_monitor(key, mask, subscriber, notify_tx, reply),
            Command::Snapshot { reply } => {
                let _ = reply.send(self.state.snapshot_names());
            }
        }
    }

    fn handle_register(
        &mut self,
        key: Key<K>,
        reply: oneshot::Sender<Result<RegisterOutcome, ClientError>>,
    ) {
        let result = self.validate_alias_owned(&key).map(|owner| {
            let (outcome, watch) = self.state.register(key.identity, owner);
            if let NeedsWatch(Some(pid)) = watch {
                self.ensure_watched(pid);
            }
            outcome
        });
        let _ = reply.send(result);
    }

    fn handle_unregister(
        &mut self,
        key: Key<K>,
        reply: oneshot::Sender<Result<UnregisterOutcome, ClientError>>,
    ) {
        let result = self
            .validate_alias_owned(&key)
            .map(|owner| self.state.unregister(key.identity, owner));
        let _ = reply.send(result);
    }

    fn handle_lookup(&self, key: Key<K>) -> Option<Pid> {
        if key.kind != KeyKind::Alias {
            warn!(?key, "lookup: non-alias key, precondition violation");
            return None;
        }
        self.state.lookup(&key.identity)
    }

    fn handle_monitor(
        &mut self,
        key: Key<K>,
        mask: Option<HashSet<EventMask>>,
        subscriber: Pid,
        notify_tx: mpsc::UnboundedSender<Notification<K>>,
        reply: oneshot::Sender<Result<MonitorRef, ClientError>>,
    ) {
        if key.kind != KeyKind::Alias {
            let _ = reply.send(Err(ClientError::PropertiesUnsupported));
            return;
        }
        let (mref, watch) =
            self.state
                .monitor(key.identity, key.scope, mask, subscriber, notify_tx);
        if let NeedsWatch(Some(pid)) = watch {
            self.ensure_watched(pid);
        }
        let _ = reply.send(Ok(mref));
    }

    /// §4.C preconditions for register/unregister: `Alias` kind and a
    /// present scope. A violation is not replied to with a domain error —
    /// per §7, the dispatcher just doesn't handle the message. We render
    /// that as a typed `Err` instead of silently dropping the reply sender
    /// and leaving the caller to hang; see DESIGN.md.
    fn validate_alias_owned(&self, key: &Key<K>) -> Result<Pid, ClientError> {
        if key.kind != KeyKind::Alias {
            return Err(ClientError::PropertiesUnsupported);
        }
        key.scope.ok_or(ClientError::InvalidRequest)
    }
}
