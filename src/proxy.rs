use std::sync::Arc;
use std::thread;

use crate::handle::SocketHandle;

/// Pipes the `out` of each handle into the `in` of the other, forever. Used
/// to wire an XSUB/XPUB pair (or any two handles) into a fan-out proxy.
///
/// Spawns two plain OS threads that block on `recv`; either side's `out`
/// channel closing tears down that one direction only.
pub fn proxy(a: SocketHandle, b: SocketHandle) {
    let a = Arc::new(a);
    let b = Arc::new(b);

    pump("proxy-a-to-b", Arc::clone(&a), Arc::clone(&b));
    pump("proxy-b-to-a", b, a);
}

fn pump(name: &'static str, from: Arc<SocketHandle>, to: Arc<SocketHandle>) {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            while let Some(frames) = from.recv() {
                if to.send(frames).is_err() {
                    log::warn!("{name}: destination full, dropping message");
                }
            }
            log::debug!("{name}: source closed, proxy leg exiting");
        })
        .expect("failed to spawn proxy thread");
}
