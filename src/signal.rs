use crate::error::Result;

/// One byte tag sent through the signaling pair. Its only purpose is to
/// unblock the poller; the real payload travels through the command queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Message,
    Shutdown,
}

impl Signal {
    fn as_byte(self) -> u8 {
        match self {
            Signal::Message => 0x01,
            Signal::Shutdown => 0x02,
        }
    }

    fn from_byte(b: u8) -> Self {
        match b {
            0x01 => Signal::Message,
            0x02 => Signal::Shutdown,
            other => unreachable!("invalid signal byte {other}: programming error"),
        }
    }
}

/// The injector-side half of the signaling pair: a PUSH socket connected to
/// the poller's PULL socket over `inproc://`.
pub struct SignalTx {
    push: zmq::Socket,
}

impl SignalTx {
    pub fn send(&self, signal: Signal) -> Result<()> {
        self.push.send(&[signal.as_byte()], zmq::DONTWAIT)?;
        Ok(())
    }
}

/// The poller-side half of the signaling pair.
pub struct SignalRx {
    pull: zmq::Socket,
}

impl SignalRx {
    pub fn socket(&self) -> &zmq::Socket {
        &self.pull
    }

    /// Reads one pending signal. Only call after `zmq::poll` has flagged the
    /// PULL socket readable.
    pub fn recv(&self) -> Result<Signal> {
        let frame = self.pull.recv_bytes(zmq::DONTWAIT)?;
        let byte = frame.first().copied().unwrap_or(0);
        Ok(Signal::from_byte(byte))
    }
}

/// Builds the PUSH/PULL pair over a unique `inproc://` address for a single
/// context. The PULL side binds first so the PUSH side's connect (with
/// `ZMQ_IMMEDIATE` set) never has to queue in front of an endpoint that
/// hasn't come up yet — this is what removes the startup race that the
/// original implementation papered over with a sleep (see DESIGN.md).
pub fn pair(ctx: &zmq::Context, addr: &str) -> Result<(SignalTx, SignalRx)> {
    let pull = ctx.socket(zmq::PULL)?;
    pull.set_conflate(true)?;
    pull.bind(addr)?;

    let push = ctx.socket(zmq::PUSH)?;
    push.set_conflate(true)?;
    push.set_immediate(true)?;
    push.connect(addr)?;

    Ok((SignalTx { push }, SignalRx { pull }))
}
