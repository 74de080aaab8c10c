use std::sync::Arc;

use crossbeam_channel::Sender;
use rand::seq::SliceRandom;

use crate::command::{Command, CommandValue};
use crate::registry::{PollerEntry, SocketRegistry};
use crate::signal::{Signal, SignalRx};

/// The single thread that exclusively owns every native MQ socket in a
/// context. Blocks in MQ's readiness call, dispatches commands from the
/// injector, and fans inbound frames out to each socket's `out` channel.
///
/// The poller never reads from a user channel — only from native sockets and
/// the command queue — so no user-channel closure can ever stall it.
pub struct Poller {
    signal: SignalRx,
    queue: Arc<crate::command::CommandQueue>,
    sockets: SocketRegistry,
    term: Sender<Vec<zmq::Socket>>,
}

impl Poller {
    pub fn new(
        signal: SignalRx,
        queue: Arc<crate::command::CommandQueue>,
        term: Sender<Vec<zmq::Socket>>,
    ) -> Self {
        Poller {
            signal,
            queue,
            sockets: SocketRegistry::new(),
            term,
        }
    }

    pub fn run(mut self) {
        loop {
            let ready_idx = match self.wait_for_ready() {
                Ok(idx) => idx,
                Err(e) => {
                    log::error!("poller: readiness call failed: {e}");
                    continue;
                }
            };

            if ready_idx.is_none() {
                // Signal socket only, nothing selected (spurious wakeup).
                continue;
            }

            if ready_idx == Some(0) {
                match self.signal.recv() {
                    Ok(Signal::Message) => {
                        let cmd = self.queue.pop();
                        self.dispatch(cmd);
                    }
                    Ok(Signal::Shutdown) => {
                        self.shutdown();
                        return;
                    }
                    Err(e) => {
                        log::error!("poller: failed to read signal: {e}");
                    }
                }
            } else {
                let idx = ready_idx.unwrap() - 1;
                if let Some((id, _)) = self.sockets.iter().nth(idx) {
                    let id = id.clone();
                    self.drain_socket(&id);
                }
            }
        }
    }

    /// Builds the poll-item list (signal socket first, then every registered
    /// socket in registration order) and blocks until one is readable.
    /// Returns the index of a uniformly-randomly-chosen ready item, or
    /// `None` if nothing was flagged readable.
    fn wait_for_ready(&self) -> zmq::Result<Option<usize>> {
        let mut items = Vec::with_capacity(1 + self.sockets.len());
        items.push(self.signal.socket().as_poll_item(zmq::POLLIN));
        for (_, entry) in self.sockets.iter() {
            items.push(entry.socket.as_poll_item(zmq::POLLIN));
        }

        zmq::poll(&mut items, -1)?;

        let ready: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_readable())
            .map(|(i, _)| i)
            .collect();

        Ok(ready.choose(&mut rand::thread_rng()).copied())
    }

    fn drain_socket(&mut self, id: &str) {
        let frames = {
            let entry = match self.sockets.get(id) {
                Some(e) => e,
                None => return,
            };
            match read_all_frames(&entry.socket) {
                Ok(frames) => frames,
                Err(e) => {
                    log::error!("poller[{id}]: recv failed: {e}");
                    return;
                }
            }
        };

        let entry = self.sockets.get(id).expect("checked above");
        if entry.out.try_send(frames).is_err() {
            log::warn!("poller[{id}]: out channel full, dropping inbound message");
        }
    }

    fn dispatch(&mut self, cmd: Command) {
        match cmd {
            Command::Register(id, socket, output) => {
                log::debug!("poller: registering {id}");
                self.sockets.insert(
                    id,
                    PollerEntry {
                        socket,
                        out: output.out,
                        ctl_out: output.ctl_out,
                    },
                );
            }
            Command::Close(id) => {
                log::debug!("poller: closing {id}");
                // Dropping the entry drops the native socket and both
                // output-side channels, in that order.
                self.sockets.remove(&id);
            }
            Command::Command(id, f) => self.run_command(&id, f),
            Command::Send(id, payload) => self.send(&id, payload),
        }
    }

    fn run_command(&mut self, id: &str, f: crate::command::CtlFn) {
        let entry = match self.sockets.get(id) {
            Some(e) => e,
            None => {
                log::error!("poller: command for unknown socket {id}");
                return;
            }
        };

        let value = match f(&entry.socket) {
            Ok(Some(v)) => CommandValue::Value(v),
            Ok(None) => CommandValue::Nil,
            Err(e) => CommandValue::Err(e),
        };

        // `ctl_out` has capacity >= 1 and is drained synchronously by the
        // one outstanding `command()` caller before another can be issued;
        // a full channel here is an invariant breach, not a normal failure.
        if entry.ctl_out.try_send(value).is_err() {
            log::error!("poller[{id}]: ctl_out full, dropping command response");
        }
    }

    fn send(&mut self, id: &str, payload: crate::command::Frames) {
        let entry = match self.sockets.get(id) {
            Some(e) => e,
            None => {
                log::error!("poller: send for unknown socket {id}");
                return;
            }
        };

        let last = payload.len().saturating_sub(1);
        for (i, frame) in payload.into_iter().enumerate() {
            let flags = if i == last { zmq::DONTWAIT } else { zmq::DONTWAIT | zmq::SNDMORE };
            match entry.socket.send(frame, flags) {
                Ok(()) => {}
                Err(zmq::Error::EAGAIN) => {
                    log::warn!("poller[{id}]: send would block, dropping message");
                    return;
                }
                Err(e) => {
                    log::error!("poller[{id}]: send failed: {e}");
                    return;
                }
            }
        }
    }

    fn shutdown(mut self) {
        log::debug!("poller: shutting down, {} socket(s) owned", self.sockets.len());
        let sockets: Vec<zmq::Socket> = self
            .sockets
            .drain()
            .map(|(_, entry)| {
                // Dropping `entry.out`/`entry.ctl_out` here closes the
                // output-side channels; `entry.socket` is handed back to
                // the shutdown barrier to be closed on the calling thread.
                entry.socket
            })
            .collect();

        let _ = self.term.send(sockets);
    }
}

fn read_all_frames(socket: &zmq::Socket) -> zmq::Result<crate::command::Frames> {
    let mut frames = Vec::new();
    loop {
        let frame = socket.recv_bytes(zmq::DONTWAIT)?;
        frames.push(frame);
        if !socket.get_rcvmore()? {
            break;
        }
    }
    Ok(frames)
}
