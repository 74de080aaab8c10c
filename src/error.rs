use thiserror::Error;

/// Errors surfaced across the public API.
///
/// Structural invariant breaches (an unrecognized signal tag, a malformed
/// control message) are not represented here — they panic the owning task
/// instead of being returned, per the error handling design: the bridge
/// absorbs transient I/O errors but never silently swallows a bug in itself.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("mq error: {0}")]
    Mq(#[from] zmq::Error),

    #[error("context is terminated")]
    ContextTerminated,

    #[error("invalid endpoint {0:?}: must start with '@' (bind) or '>' (connect)")]
    InvalidEndpoint(String),

    #[error("operation would block")]
    WouldBlock,

    #[error("socket handle is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
