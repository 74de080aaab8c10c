use std::any::Any;
use std::fmt;

use concurrent_queue::ConcurrentQueue;
use crossbeam_channel::{Receiver, Sender};

use crate::error::{BridgeError, Result};

/// A single MQ frame.
pub type Frame = Vec<u8>;

/// An ordered sequence of frames — a single frame is just a one-element
/// sequence; receivers never need to special-case arity.
pub type Frames = Vec<Frame>;

/// The boxed dynamic result of a user closure submitted through `command`.
pub enum CommandValue {
    Nil,
    Value(Box<dyn Any + Send>),
    Err(BridgeError),
}

impl fmt::Debug for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandValue::Nil => write!(f, "CommandValue::Nil"),
            CommandValue::Value(_) => write!(f, "CommandValue::Value(..)"),
            CommandValue::Err(e) => write!(f, "CommandValue::Err({e})"),
        }
    }
}

/// A closure that manipulates a native socket on the poller thread.
///
/// Returns `Ok(Some(value))` for a value result, `Ok(None)` for a
/// legitimate "no value" result (translated to the nil-sentinel on
/// `ctl_out`), or `Err` if the operation failed.
pub type CtlFn = Box<dyn FnOnce(&zmq::Socket) -> Result<Option<Box<dyn Any + Send>>> + Send>;

/// The output-side channels handed to the poller when a socket registers.
pub struct OutputChans {
    pub out: Sender<Frames>,
    pub ctl_out: Sender<CommandValue>,
}

/// The full set of channels created for one socket, before the injector
/// splits them into the input side it keeps and the output side it hands
/// off to the poller.
pub struct SocketChans {
    pub in_: Receiver<Frames>,
    pub out: Sender<Frames>,
    pub ctl_in: Receiver<CtlFn>,
    pub ctl_out: Sender<CommandValue>,
}

/// A unit of work flowing from the injector to the poller.
pub enum Command {
    Register(String, zmq::Socket, OutputChans),
    Close(String),
    Command(String, CtlFn),
    Send(String, Frames),
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Register(id, ..) => write!(f, "Command::Register({id})"),
            Command::Close(id) => write!(f, "Command::Close({id})"),
            Command::Command(id, _) => write!(f, "Command::Command({id})"),
            Command::Send(id, frames) => {
                write!(f, "Command::Send({id}, {} frame(s))", frames.len())
            }
        }
    }
}

/// The single-producer/single-consumer queue carrying `Command`s from the
/// injector to the poller. Paired 1:1 with a `Signal::Message` sent through
/// the signaling pair: the poller only ever pops after observing readiness
/// on the signal PULL socket, and pops exactly once per signal.
pub struct CommandQueue {
    queue: ConcurrentQueue<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        CommandQueue {
            queue: ConcurrentQueue::unbounded(),
        }
    }

    pub fn push(&self, cmd: Command) {
        // An unbounded queue never rejects a push; `Err` only occurs once
        // the queue has been closed, which only happens after shutdown, at
        // which point the injector has already stopped enqueuing.
        let _ = self.queue.push(cmd);
    }

    /// Pops exactly one command. Call only after a `Signal::Message` has
    /// been observed — an empty pop here is a structural bug.
    pub fn pop(&self) -> Command {
        self.queue
            .pop()
            .expect("command queue empty after Signal::Message: programming error")
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
