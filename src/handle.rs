use std::any::Any;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::command::{CommandValue, CtlFn, Frames};
use crate::error::{BridgeError, Result};

/// The user-facing bundle of four channels bound to one registered MQ socket.
///
/// `send`/`recv`/`try_recv` move message payloads; `command` and its thin
/// wrappers (`bind`, `connect`, `subscribe`, ...) run arbitrary closures
/// against the native socket on the poller thread and block for the result.
pub struct SocketHandle {
    in_: Sender<Frames>,
    out: Receiver<Frames>,
    ctl_in: Sender<CtlFn>,
    ctl_out: Receiver<CommandValue>,
}

impl SocketHandle {
    pub(crate) fn new(
        in_: Sender<Frames>,
        out: Receiver<Frames>,
        ctl_in: Sender<CtlFn>,
        ctl_out: Receiver<CommandValue>,
    ) -> Self {
        SocketHandle { in_, out, ctl_in, ctl_out }
    }

    /// Non-blocking enqueue onto `in`. `msg` is a single frame or, if longer
    /// than one element, a multipart sequence sent with `SNDMORE` between
    /// frames. Never blocks the caller: a full channel drops the message and
    /// returns `Err(WouldBlock)` rather than waiting for the injector.
    pub fn send(&self, msg: Frames) -> Result<()> {
        match self.in_.try_send(msg) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(BridgeError::WouldBlock),
            Err(TrySendError::Disconnected(_)) => Err(BridgeError::Closed),
        }
    }

    /// Blocking read from `out`. Returns `None` once the socket is closed.
    pub fn recv(&self) -> Option<Frames> {
        self.out.recv().ok()
    }

    /// Non-blocking read from `out`. Returns `None` if empty or closed.
    pub fn try_recv(&self) -> Option<Frames> {
        self.out.try_recv().ok()
    }

    /// Runs `f` against the native socket on the poller thread and blocks
    /// for its result. A closure that legitimately has nothing to return
    /// should produce `Ok(None)`, which comes back here as `Box::new(())`.
    pub fn command<F>(&self, f: F) -> Result<Box<dyn Any + Send>>
    where
        F: FnOnce(&zmq::Socket) -> Result<Option<Box<dyn Any + Send>>> + Send + 'static,
    {
        let boxed: CtlFn = Box::new(f);
        self.ctl_in.send(boxed).map_err(|_| BridgeError::Closed)?;

        match self.ctl_out.recv() {
            Ok(CommandValue::Nil) => Ok(Box::new(())),
            Ok(CommandValue::Value(v)) => Ok(v),
            Ok(CommandValue::Err(e)) => Err(e),
            Err(_) => Err(BridgeError::Closed),
        }
    }

    pub fn bind(&self, endpoint: &str) -> Result<()> {
        let ep = endpoint.to_string();
        self.command(move |sock| sock.bind(&ep).map(|_| None).map_err(BridgeError::from))?;
        Ok(())
    }

    pub fn unbind(&self, endpoint: &str) -> Result<()> {
        let ep = endpoint.to_string();
        self.command(move |sock| sock.unbind(&ep).map(|_| None).map_err(BridgeError::from))?;
        Ok(())
    }

    pub fn connect(&self, endpoint: &str) -> Result<()> {
        let ep = endpoint.to_string();
        self.command(move |sock| sock.connect(&ep).map(|_| None).map_err(BridgeError::from))?;
        Ok(())
    }

    pub fn disconnect(&self, endpoint: &str) -> Result<()> {
        let ep = endpoint.to_string();
        self.command(move |sock| sock.disconnect(&ep).map(|_| None).map_err(BridgeError::from))?;
        Ok(())
    }

    pub fn subscribe(&self, topic: impl Into<Vec<u8>>) -> Result<()> {
        let topic = topic.into();
        self.command(move |sock| sock.set_subscribe(&topic).map(|_| None).map_err(BridgeError::from))?;
        Ok(())
    }

    pub fn unsubscribe(&self, topic: impl Into<Vec<u8>>) -> Result<()> {
        let topic = topic.into();
        self.command(move |sock| sock.set_unsubscribe(&topic).map(|_| None).map_err(BridgeError::from))?;
        Ok(())
    }

    /// `@addr` binds, `>addr` connects; any other prefix is rejected.
    pub fn attach(&self, endpoint: &str) -> Result<()> {
        match endpoint.as_bytes().first() {
            Some(b'@') => self.bind(&endpoint[1..]),
            Some(b'>') => self.connect(&endpoint[1..]),
            _ => Err(BridgeError::InvalidEndpoint(endpoint.to_string())),
        }
    }

    /// Probes the socket with a non-blocking `ctl_in` write of a no-op
    /// closure, never routing through the blocking `command()` path: under
    /// injector contention (many registered sockets, heavy churn) a blocking
    /// send could sit queued for an arbitrary time even though the socket is
    /// perfectly alive, which would make this probe useless for a quick
    /// liveness check. A disconnected `ctl_in` means the poller has already
    /// torn the socket down — `true`. A momentarily full `ctl_in` just means
    /// the injector hasn't reached this channel in its select yet, which is
    /// not the same as "gone" — `false`, without waiting. Only a send that
    /// is actually accepted waits for the matching `ctl_out` response.
    pub fn terminated(&self) -> bool {
        let probe: CtlFn = Box::new(|_sock| Ok(None));
        match self.ctl_in.try_send(probe) {
            Ok(()) => {
                let _ = self.ctl_out.recv();
                false
            }
            Err(TrySendError::Disconnected(_)) => true,
            Err(TrySendError::Full(_)) => false,
        }
    }

    /// Closes `in`, which the injector observes as a teardown request for
    /// this socket (see the channel registry's close ordering).
    pub fn close(self) {
        drop(self.in_);
    }
}
