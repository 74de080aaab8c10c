use std::fmt;

/// The MQ socket types this bridge can register.
///
/// Mirrors `zmq::SocketType` one-to-one. Kept as a separate enum (rather than
/// re-exporting `zmq::SocketType` directly) so the lowercase name returned by
/// `as_str` — used to build a socket's stable id — is part of this crate's
/// own contract and doesn't shift if the `zmq` crate ever renames a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketKind {
    Pair,
    Pub,
    Sub,
    Req,
    Rep,
    Dealer,
    Router,
    Xpub,
    Xsub,
    Pull,
    Push,
    Stream,
}

impl SocketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocketKind::Pair => "pair",
            SocketKind::Pub => "pub",
            SocketKind::Sub => "sub",
            SocketKind::Req => "req",
            SocketKind::Rep => "rep",
            SocketKind::Dealer => "dealer",
            SocketKind::Router => "router",
            SocketKind::Xpub => "xpub",
            SocketKind::Xsub => "xsub",
            SocketKind::Pull => "pull",
            SocketKind::Push => "push",
            SocketKind::Stream => "stream",
        }
    }

    pub fn to_zmq(self) -> zmq::SocketType {
        match self {
            SocketKind::Pair => zmq::PAIR,
            SocketKind::Pub => zmq::PUB,
            SocketKind::Sub => zmq::SUB,
            SocketKind::Req => zmq::REQ,
            SocketKind::Rep => zmq::REP,
            SocketKind::Dealer => zmq::DEALER,
            SocketKind::Router => zmq::ROUTER,
            SocketKind::Xpub => zmq::XPUB,
            SocketKind::Xsub => zmq::XSUB,
            SocketKind::Pull => zmq::PULL,
            SocketKind::Push => zmq::PUSH,
            SocketKind::Stream => zmq::STREAM,
        }
    }
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
