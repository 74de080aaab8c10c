use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use once_cell::sync::OnceCell;

use crate::command::{CommandQueue, SocketChans};
use crate::error::{BridgeError, Result};
use crate::handle::SocketHandle;
use crate::injector::{CtlMsg, Injector};
use crate::options::SocketOptions;
use crate::poller::Poller;
use crate::signal;
use crate::socket_kind::SocketKind;

static DEFAULT: OnceCell<Context> = OnceCell::new();
static CONTEXT_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Handles to the running injector/poller pair, held only while the context
/// is alive. Taken and torn down exactly once by `close`.
struct Tasks {
    ctl_chan: Sender<CtlMsg>,
    injector_term: Receiver<()>,
    poller_term: Receiver<Vec<zmq::Socket>>,
    injector_handle: JoinHandle<()>,
    poller_handle: JoinHandle<()>,
}

struct ContextInner {
    zmq_ctx: zmq::Context,
    thread_tag: String,
    tasks: Mutex<Option<Tasks>>,
    closed: AtomicBool,
}

/// A logical grouping owning one MQ context, its signaling pair, its command
/// queue, and the injector/poller task pair. Cheap to clone: internally an
/// `Arc`, so every clone shares the same running bridge engine.
#[derive(Clone)]
pub struct Context(Arc<ContextInner>);

impl Context {
    pub fn new() -> Result<Self> {
        Self::with_io_threads(1)
    }

    pub fn with_io_threads(io_threads: i32) -> Result<Self> {
        let zmq_ctx = zmq::Context::new();
        zmq_ctx.set_io_threads(io_threads)?;

        let n = CONTEXT_COUNTER.fetch_add(1, Ordering::Relaxed);
        Ok(Context(Arc::new(ContextInner {
            zmq_ctx,
            thread_tag: format!("ctx{n}"),
            tasks: Mutex::new(None),
            closed: AtomicBool::new(false),
        })))
    }

    /// The lazily-initialized process-wide default context. Never closed
    /// automatically; callers that want a clean shutdown should build and
    /// hold their own `Context` instead.
    pub fn global() -> Self {
        DEFAULT
            .get_or_init(|| Context::new().expect("failed to create default MQ context"))
            .clone()
    }

    /// Starts the injector/poller pair if they are not already running.
    /// Idempotent — safe to call from every `socket()` call.
    pub fn init(&self) {
        let mut tasks = self.0.tasks.lock().unwrap();
        if tasks.is_some() {
            return;
        }

        let tag = self.0.thread_tag.clone();
        let signal_addr = format!("inproc://zmq-bridge-signal-{tag}");
        let (signal_tx, signal_rx) =
            signal::pair(&self.0.zmq_ctx, &signal_addr).expect("failed to build signaling pair");

        let queue = Arc::new(CommandQueue::new());
        let (poller_term_tx, poller_term_rx) = bounded(1);
        let (injector_term_tx, injector_term_rx) = bounded(1);
        let (ctl_tx, ctl_rx) = unbounded();

        let poller = Poller::new(signal_rx, Arc::clone(&queue), poller_term_tx);
        let poller_handle = thread::Builder::new()
            .name(format!("{tag}-poller"))
            .spawn(move || poller.run())
            .expect("failed to spawn poller thread");

        let injector = Injector::new(ctl_rx, signal_tx, queue, injector_term_tx, tag.clone());
        let injector_handle = thread::Builder::new()
            .name(format!("{tag}-injector"))
            .spawn(move || injector.run())
            .expect("failed to spawn injector thread");

        *tasks = Some(Tasks {
            ctl_chan: ctl_tx,
            injector_term: injector_term_rx,
            poller_term: poller_term_rx,
            injector_handle,
            poller_handle,
        });
    }

    /// Registers a new socket of the given kind, applies `options`, and
    /// returns the handle bundle. Starts the bridge engine on first use.
    pub fn socket(&self, kind: SocketKind, options: SocketOptions) -> Result<SocketHandle> {
        if self.0.closed.load(Ordering::Acquire) {
            return Err(BridgeError::ContextTerminated);
        }
        self.init();

        let native = self.0.zmq_ctx.socket(kind.to_zmq()).map_err(|e| match e {
            zmq::Error::ETERM => BridgeError::ContextTerminated,
            other => BridgeError::from(other),
        })?;
        options.apply(&native)?;

        let (in_tx, in_rx) = bounded(0);
        let (out_tx, out_rx) = options.out_bound();
        let (ctl_in_tx, ctl_in_rx) = bounded(0);
        let (ctl_out_tx, ctl_out_rx) = bounded(1);

        let chans = SocketChans {
            in_: in_rx,
            out: out_tx,
            ctl_in: ctl_in_rx,
            ctl_out: ctl_out_tx,
        };

        let ctl_chan = {
            let tasks = self.0.tasks.lock().unwrap();
            tasks.as_ref().expect("init() just ran").ctl_chan.clone()
        };
        ctl_chan
            .send(CtlMsg::Register(native, kind, chans))
            .map_err(|_| BridgeError::ContextTerminated)?;

        Ok(SocketHandle::new(in_tx, out_rx, ctl_in_tx, ctl_out_rx))
    }

    /// Closes the control channel, runs the shutdown barrier described in
    /// the context lifecycle design, and joins both tasks. Idempotent:
    /// returns `true` the first time, `false` on every later call.
    pub fn close(&self) -> bool {
        if self.0.closed.swap(true, Ordering::AcqRel) {
            return false;
        }

        let tasks = self.0.tasks.lock().unwrap().take();
        let Some(tasks) = tasks else {
            return true;
        };

        drop(tasks.ctl_chan);
        let _ = tasks.injector_term.recv();
        let sockets = tasks.poller_term.recv().unwrap_or_default();
        drop(sockets);
        let _ = tasks.injector_handle.join();
        let _ = tasks.poller_handle.join();

        true
    }

    pub fn terminated(&self) -> bool {
        self.0.closed.load(Ordering::Acquire)
    }
}
