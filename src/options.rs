use crossbeam_channel::{bounded, Receiver, Sender};

use crate::command::Frames;
use crate::error::Result;

/// Parsed form of the recognized socket-factory option keys. Applied by
/// `Context::socket` in a fixed order: identity, PLAIN credentials, ZAP
/// domain, HWMs, bind endpoints, connect endpoints, subscriptions, req-retry.
/// Some of these are latched at connect time by libzmq, so applying them
/// after bind/connect is a correctness bug, not a style choice.
pub struct SocketOptions {
    pub bind: Vec<String>,
    pub connect: Vec<String>,
    pub identity: Option<Vec<u8>>,
    pub plain_server: bool,
    pub plain_username: Option<String>,
    pub plain_password: Option<String>,
    pub zap_domain: Option<String>,
    pub send_hwm: Option<i32>,
    pub recv_hwm: Option<i32>,
    pub subscribe: Vec<Vec<u8>>,
    pub req_retry: bool,
    pub out_capacity: usize,
}

impl Default for SocketOptions {
    fn default() -> Self {
        SocketOptions {
            bind: Vec::new(),
            connect: Vec::new(),
            identity: None,
            plain_server: false,
            plain_username: None,
            plain_password: None,
            zap_domain: None,
            send_hwm: None,
            recv_hwm: None,
            subscribe: Vec::new(),
            req_retry: false,
            out_capacity: 1000,
        }
    }
}

impl SocketOptions {
    pub fn builder() -> SocketOptionsBuilder {
        SocketOptionsBuilder::default()
    }

    pub(crate) fn out_bound(&self) -> (Sender<Frames>, Receiver<Frames>) {
        bounded(self.out_capacity)
    }

    pub(crate) fn apply(&self, socket: &zmq::Socket) -> Result<()> {
        if let Some(id) = &self.identity {
            socket.set_identity(id)?;
        }
        if self.plain_server {
            socket.set_plain_server(true)?;
        }
        if let Some(u) = &self.plain_username {
            socket.set_plain_username(Some(u))?;
        }
        if let Some(p) = &self.plain_password {
            socket.set_plain_password(Some(p))?;
        }
        if let Some(domain) = &self.zap_domain {
            socket.set_zap_domain(domain)?;
        }
        if let Some(hwm) = self.send_hwm {
            socket.set_sndhwm(hwm)?;
        }
        if let Some(hwm) = self.recv_hwm {
            socket.set_rcvhwm(hwm)?;
        }

        for ep in &self.bind {
            socket.bind(ep)?;
        }
        for ep in &self.connect {
            socket.connect(ep)?;
        }
        for topic in &self.subscribe {
            socket.set_subscribe(topic)?;
        }
        if self.req_retry {
            socket.set_req_relaxed(true)?;
            socket.set_req_correlate(true)?;
        }

        Ok(())
    }
}

/// Builder for `SocketOptions`. Every setter takes `self` by value so calls
/// chain naturally; `build()` yields the parsed options struct.
#[derive(Default)]
pub struct SocketOptionsBuilder {
    opts: SocketOptions,
}

impl SocketOptionsBuilder {
    pub fn bind(mut self, endpoint: impl Into<String>) -> Self {
        self.opts.bind.push(endpoint.into());
        self
    }

    pub fn connect(mut self, endpoint: impl Into<String>) -> Self {
        self.opts.connect.push(endpoint.into());
        self
    }

    pub fn identity(mut self, id: impl Into<Vec<u8>>) -> Self {
        self.opts.identity = Some(id.into());
        self
    }

    pub fn plain_server(mut self, enabled: bool) -> Self {
        self.opts.plain_server = enabled;
        self
    }

    pub fn plain_username(mut self, username: impl Into<String>) -> Self {
        self.opts.plain_username = Some(username.into());
        self
    }

    pub fn plain_password(mut self, password: impl Into<String>) -> Self {
        self.opts.plain_password = Some(password.into());
        self
    }

    pub fn zap_domain(mut self, domain: impl Into<String>) -> Self {
        self.opts.zap_domain = Some(domain.into());
        self
    }

    pub fn send_hwm(mut self, hwm: i32) -> Self {
        self.opts.send_hwm = Some(hwm);
        self
    }

    pub fn recv_hwm(mut self, hwm: i32) -> Self {
        self.opts.recv_hwm = Some(hwm);
        self
    }

    pub fn subscribe(mut self, topic: impl Into<Vec<u8>>) -> Self {
        self.opts.subscribe.push(topic.into());
        self
    }

    pub fn req_retry(mut self, enabled: bool) -> Self {
        self.opts.req_retry = enabled;
        self
    }

    pub fn out_capacity(mut self, capacity: usize) -> Self {
        self.opts.out_capacity = capacity;
        self
    }

    pub fn build(self) -> SocketOptions {
        self.opts
    }
}
