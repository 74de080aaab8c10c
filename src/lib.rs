//! A thread-safe bridge between MQ sockets and `crossbeam-channel` channels.
//!
//! MQ sockets are strictly single-threaded: the same socket handle must only
//! ever be touched by one thread at a time. This crate lets arbitrary
//! threads send, receive, and issue arbitrary socket commands through plain
//! channels, while a two-thread bridge engine — an injector and a poller,
//! coupled by a one-way signal and a shared command queue — does the actual
//! MQ work on sockets' behalf.
//!
//! ```no_run
//! use zmq_bridge::{Context, SocketKind, SocketOptions};
//!
//! let ctx = Context::new().unwrap();
//!
//! let rep = ctx
//!     .socket(SocketKind::Rep, SocketOptions::builder().bind("inproc://demo").build())
//!     .unwrap();
//! let req = ctx
//!     .socket(SocketKind::Req, SocketOptions::builder().connect("inproc://demo").build())
//!     .unwrap();
//!
//! req.send(vec![b"ping".to_vec()]).unwrap();
//! assert_eq!(rep.recv().unwrap(), vec![b"ping".to_vec()]);
//! rep.send(vec![b"pong".to_vec()]).unwrap();
//! assert_eq!(req.recv().unwrap(), vec![b"pong".to_vec()]);
//!
//! ctx.close();
//! ```

mod command;
mod context;
mod error;
mod handle;
mod injector;
mod options;
mod poller;
mod proxy;
mod registry;
mod signal;
mod socket_kind;

pub use command::{CommandValue, Frame, Frames};
pub use context::Context;
pub use error::{BridgeError, Result};
pub use handle::SocketHandle;
pub use options::{SocketOptions, SocketOptionsBuilder};
pub use proxy::proxy;
pub use socket_kind::SocketKind;
