use indexmap::IndexMap;

use crossbeam_channel::{Receiver, Sender};

use crate::command::{CommandValue, CtlFn, Frames};

/// One poller-owned socket: the native handle plus the write side of its
/// two outbound channels.
pub struct PollerEntry {
    pub socket: zmq::Socket,
    pub out: Sender<Frames>,
    pub ctl_out: Sender<CommandValue>,
}

/// Poller-local map: stable id → (native socket, outbound/ctl-out channels).
/// Thread-confined to the poller task; no locking required.
#[derive(Default)]
pub struct SocketRegistry {
    entries: IndexMap<String, PollerEntry>,
}

impl SocketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: String, entry: PollerEntry) {
        self.entries.insert(id, entry);
    }

    pub fn remove(&mut self, id: &str) -> Option<PollerEntry> {
        self.entries.shift_remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&PollerEntry> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PollerEntry)> {
        self.entries.iter()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = (String, PollerEntry)> + '_ {
        self.entries.drain(..)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One injector-owned socket: the read side of its two inbound channels.
pub struct InjectorEntry {
    pub in_: Receiver<Frames>,
    pub ctl_in: Receiver<CtlFn>,
}

/// Injector-local map: stable id → (inbound/ctl-in channels). Thread-confined
/// to the injector task; no locking required.
#[derive(Default)]
pub struct ChannelRegistry {
    entries: IndexMap<String, InjectorEntry>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: String, entry: InjectorEntry) {
        self.entries.insert(id, entry);
    }

    pub fn remove(&mut self, id: &str) -> Option<InjectorEntry> {
        self.entries.shift_remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&InjectorEntry> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &InjectorEntry)> {
        self.entries.iter()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = (String, InjectorEntry)> + '_ {
        self.entries.drain(..)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
