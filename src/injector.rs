use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Select, Sender};

use crate::command::{Command, CommandQueue, OutputChans, SocketChans};
use crate::registry::{ChannelRegistry, InjectorEntry};
use crate::signal::{Signal, SignalTx};
use crate::socket_kind::SocketKind;

/// A context-level instruction delivered to the injector through the
/// control channel seeded as `"__ctl__"`.
pub enum CtlMsg {
    Register(zmq::Socket, SocketKind, SocketChans),
}

enum Outcome {
    Ctl(Result<CtlMsg, crossbeam_channel::RecvError>),
    In(String, Result<crate::command::Frames, crossbeam_channel::RecvError>),
    CtlIn(String, Result<crate::command::CtlFn, crossbeam_channel::RecvError>),
}

/// The single thread that owns the read side of every user-supplied input
/// channel and serializes user intent into the poller's command queue.
///
/// The injector never synchronously awaits a poller response, so no cycle
/// exists between the two tasks: it only ever pushes commands and signals.
pub struct Injector {
    ctl_chan: Receiver<CtlMsg>,
    chans: ChannelRegistry,
    signal: SignalTx,
    queue: Arc<CommandQueue>,
    term: Sender<()>,
    counter: AtomicUsize,
    thread_tag: String,
}

impl Injector {
    pub fn new(
        ctl_chan: Receiver<CtlMsg>,
        signal: SignalTx,
        queue: Arc<CommandQueue>,
        term: Sender<()>,
        thread_tag: String,
    ) -> Self {
        Injector {
            ctl_chan,
            chans: ChannelRegistry::new(),
            signal,
            queue,
            term,
            counter: AtomicUsize::new(0),
            thread_tag,
        }
    }

    pub fn run(mut self) {
        loop {
            // Snapshot registered ids so the `Select` build and the later
            // dispatch agree on indices; `chans` is not mutated in between.
            let ids: Vec<String> = self.chans.iter().map(|(id, _)| id.clone()).collect();

            let mut sel = Select::new();
            sel.recv(&self.ctl_chan);
            for id in &ids {
                let entry = self.chans.get(id).expect("snapshot taken under exclusive ownership");
                sel.recv(&entry.in_);
                sel.recv(&entry.ctl_in);
            }

            let op = sel.select();
            let idx = op.index();

            // Resolve the selected operation into owned data while `sel`'s
            // borrow of `self.chans` is still alive, then drop `sel` before
            // touching `self.chans` mutably below.
            let outcome = if idx == 0 {
                Outcome::Ctl(op.recv(&self.ctl_chan))
            } else {
                let socket_idx = (idx - 1) / 2;
                let is_ctl_in = (idx - 1) % 2 == 1;
                let id = ids[socket_idx].clone();
                let entry = self.chans.get(&id).expect("snapshot taken under exclusive ownership");

                if is_ctl_in {
                    let ctl_in = entry.ctl_in.clone();
                    Outcome::CtlIn(id, op.recv(&ctl_in))
                } else {
                    let in_ = entry.in_.clone();
                    Outcome::In(id, op.recv(&in_))
                }
            };
            drop(sel);

            match outcome {
                Outcome::Ctl(Ok(CtlMsg::Register(native, kind, chans))) => {
                    self.handle_register(kind, native, chans);
                }
                Outcome::Ctl(Err(_)) => {
                    self.shutdown();
                    return;
                }
                Outcome::In(id, Ok(payload)) => self.on_send(&id, payload),
                Outcome::In(id, Err(_)) => self.on_input_closed(&id),
                Outcome::CtlIn(id, Ok(f)) => self.on_command(&id, f),
                Outcome::CtlIn(id, Err(_)) => self.on_input_closed(&id),
            }
        }
    }

    fn handle_register(&mut self, kind: SocketKind, native: zmq::Socket, chans: SocketChans) {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let id = format!("{}-{}-{}", self.thread_tag, kind.as_str(), n);

        log::debug!("injector: registering {id}");

        self.chans.insert(
            id.clone(),
            InjectorEntry {
                in_: chans.in_,
                ctl_in: chans.ctl_in,
            },
        );

        self.queue.push(Command::Register(
            id,
            native,
            OutputChans {
                out: chans.out,
                ctl_out: chans.ctl_out,
            },
        ));
        let _ = self.signal.send(Signal::Message);
    }

    fn on_send(&mut self, id: &str, payload: crate::command::Frames) {
        self.queue.push(Command::Send(id.to_string(), payload));
        let _ = self.signal.send(Signal::Message);
    }

    fn on_command(&mut self, id: &str, f: crate::command::CtlFn) {
        self.queue.push(Command::Command(id.to_string(), f));
        let _ = self.signal.send(Signal::Message);
    }

    fn on_input_closed(&mut self, id: &str) {
        log::debug!("injector: {id} input closed, tearing down");
        self.chans.remove(id);
        self.queue.push(Command::Close(id.to_string()));
        let _ = self.signal.send(Signal::Message);
    }

    fn shutdown(mut self) {
        log::debug!("injector: shutting down, {} socket(s) owned", self.chans.len());
        self.chans.drain().for_each(drop);
        let _ = self.signal.send(Signal::Shutdown);
        let _ = self.term.send(());
    }
}
