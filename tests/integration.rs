use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use std::time::{Duration, Instant};

use serial_test::serial;

use zmq_bridge::{BridgeError, Context, SocketKind, SocketOptions};

static INIT_LOG: Once = Once::new();

fn init() {
    INIT_LOG.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn bound_endpoint(sock: &zmq_bridge::SocketHandle) -> String {
    *sock
        .command(|native| {
            let ep = native
                .get_last_endpoint()
                .map_err(BridgeError::from)?
                .map_err(|_| BridgeError::InvalidEndpoint("non-utf8 endpoint".into()))?;
            Ok(Some(Box::new(ep) as Box<dyn Any + Send>))
        })
        .expect("get_last_endpoint command failed")
        .downcast::<String>()
        .expect("expected a String endpoint")
}

/// Scenario 1: ping-pong over REQ/REP. A bounded number of rounds, counting
/// up on both ends; they must agree at the end.
#[test]
#[serial]
fn ping_pong_req_rep() {
    init();
    let ctx = Context::new().unwrap();

    let rep = ctx
        .socket(SocketKind::Rep, SocketOptions::builder().bind("inproc://ping-pong").build())
        .unwrap();
    let req = ctx
        .socket(SocketKind::Req, SocketOptions::builder().connect("inproc://ping-pong").build())
        .unwrap();

    const ROUNDS: usize = 100;

    req.send(vec![b"0".to_vec()]).unwrap();
    for i in 0..ROUNDS {
        let request = rep.recv().expect("rep recv");
        assert_eq!(request, vec![i.to_string().into_bytes()]);

        let reply = (i + 1).to_string().into_bytes();
        rep.send(vec![reply.clone()]).unwrap();

        let response = req.recv().expect("req recv");
        assert_eq!(response, vec![reply]);

        if i + 1 < ROUNDS {
            req.send(vec![(i + 1).to_string().into_bytes()]).unwrap();
        }
    }

    assert!(ctx.close());
    assert!(!ctx.close());
}

/// Universal property: multipart integrity. A message of `|M|` frames must
/// arrive as exactly `|M|` frames, in order, on the receiving end.
#[test]
#[serial]
fn multipart_integrity() {
    init();
    let ctx = Context::new().unwrap();

    let a = ctx
        .socket(SocketKind::Pair, SocketOptions::builder().bind("inproc://multipart").build())
        .unwrap();
    let b = ctx
        .socket(SocketKind::Pair, SocketOptions::builder().connect("inproc://multipart").build())
        .unwrap();

    let frames = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
    a.send(frames.clone()).unwrap();

    let received = b.recv().expect("pair recv");
    assert_eq!(received.len(), frames.len());
    assert_eq!(received, frames);

    assert!(ctx.close());
}

/// Scenario 2: one PUB, N SUBs each subscribed to a distinct topic. Every
/// SUB must observe exactly its matching message.
#[test]
#[serial]
fn pub_sub_fan_out() {
    init();
    let ctx = Context::new().unwrap();

    let publisher = ctx
        .socket(SocketKind::Pub, SocketOptions::builder().bind("tcp://127.0.0.1:0").build())
        .unwrap();
    let endpoint = bound_endpoint(&publisher);

    const N: usize = 6;
    let subs: Vec<_> = (0..N)
        .map(|i| {
            let topic = i.to_string().into_bytes();
            ctx.socket(
                SocketKind::Sub,
                SocketOptions::builder()
                    .connect(endpoint.clone())
                    .subscribe(topic)
                    .build(),
            )
            .unwrap()
        })
        .collect();

    // Let subscriptions propagate before publishing (no fixed sleep length
    // mandated by the design; this bound is generous for a local fan-out).
    std::thread::sleep(Duration::from_millis(200));

    for i in 0..N {
        let topic = i.to_string().into_bytes();
        publisher.send(vec![topic]).unwrap();
    }

    for (i, sub) in subs.iter().enumerate() {
        let frames = sub.recv().expect("sub recv");
        assert_eq!(frames, vec![i.to_string().into_bytes()]);
    }

    assert!(ctx.close());
}

/// Scenario 3: create a batch of sockets of random-ish (but non-REP/ROUTER)
/// kinds bound to unique inproc addresses, then close the context. The
/// context must report terminated afterward.
#[test]
#[serial]
fn startup_shutdown_stress() {
    init();
    let ctx = Context::new().unwrap();

    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let kinds = [
        SocketKind::Pair,
        SocketKind::Pub,
        SocketKind::Sub,
        SocketKind::Dealer,
        SocketKind::Push,
        SocketKind::Pull,
    ];

    let mut handles = Vec::new();
    for i in 0..40 {
        let kind = kinds[i % kinds.len()];
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let addr = format!("inproc://stress-{n}");
        let handle = ctx
            .socket(kind, SocketOptions::builder().bind(addr).build())
            .unwrap();
        handles.push(handle);
    }

    assert!(!ctx.terminated());
    assert!(ctx.close());

    let deadline = Instant::now() + Duration::from_secs(2);
    while !ctx.terminated() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(ctx.terminated());

    for handle in &handles {
        assert!(handle.terminated());
    }
}

/// Scenario 5: XSUB/XPUB proxy. PUBs connect to the XSUB side, SUBs connect
/// to the XPUB side, each subscribed to its own topic.
#[test]
#[serial]
fn xsub_xpub_proxy() {
    init();
    let ctx = Context::new().unwrap();

    let xsub = ctx
        .socket(SocketKind::Xsub, SocketOptions::builder().bind("tcp://127.0.0.1:0").build())
        .unwrap();
    let xsub_endpoint = bound_endpoint(&xsub);

    let xpub = ctx
        .socket(SocketKind::Xpub, SocketOptions::builder().bind("tcp://127.0.0.1:0").build())
        .unwrap();
    let xpub_endpoint = bound_endpoint(&xpub);

    zmq_bridge::proxy(xsub, xpub);

    let publisher = ctx
        .socket(SocketKind::Pub, SocketOptions::builder().connect(xsub_endpoint).build())
        .unwrap();

    const N: usize = 4;
    let subs: Vec<_> = (0..N)
        .map(|i| {
            let topic = i.to_string().into_bytes();
            ctx.socket(
                SocketKind::Sub,
                SocketOptions::builder()
                    .connect(xpub_endpoint.clone())
                    .subscribe(topic)
                    .build(),
            )
            .unwrap()
        })
        .collect();

    std::thread::sleep(Duration::from_millis(300));

    for i in 0..N {
        publisher.send(vec![i.to_string().into_bytes()]).unwrap();
    }

    for (i, sub) in subs.iter().enumerate() {
        let frames = sub.recv().expect("sub recv through proxy");
        assert_eq!(frames, vec![i.to_string().into_bytes()]);
    }

    assert!(ctx.close());
}

/// Scenario 6: repeated bind/connect/exchange/unbind/disconnect churn on a
/// REQ/REP pair must succeed every iteration with no leaked state.
#[test]
#[serial]
fn reconnect_rebind_churn() {
    init();
    let ctx = Context::new().unwrap();

    let rep = ctx.socket(SocketKind::Rep, SocketOptions::default()).unwrap();
    let req = ctx.socket(SocketKind::Req, SocketOptions::default()).unwrap();

    for _ in 0..10 {
        rep.bind("tcp://127.0.0.1:0").unwrap();
        let endpoint = bound_endpoint(&rep);
        req.connect(endpoint.clone()).unwrap();

        req.send(vec![b"hello".to_vec()]).unwrap();
        assert_eq!(rep.recv().unwrap(), vec![b"hello".to_vec()]);
        rep.send(vec![b"world".to_vec()]).unwrap();
        assert_eq!(req.recv().unwrap(), vec![b"world".to_vec()]);

        req.disconnect(endpoint.clone()).unwrap();
        rep.unbind(endpoint).unwrap();
    }

    assert!(ctx.close());
}

/// Universal property: concurrent sends, receives, commands, and socket
/// churn all make progress without any thread blocking forever.
#[test]
#[serial]
fn deadlock_seeker() {
    init();
    let ctx = Context::new().unwrap();

    let rep = ctx
        .socket(SocketKind::Rep, SocketOptions::builder().bind("inproc://deadlock-seeker").build())
        .unwrap();
    let req = ctx
        .socket(SocketKind::Req, SocketOptions::builder().connect("inproc://deadlock-seeker").build())
        .unwrap();

    let rep_loop = std::thread::spawn(move || {
        for _ in 0..50 {
            if let Some(request) = rep.recv() {
                rep.send(request).ok();
            }
        }
    });
    let req_loop = std::thread::spawn(move || {
        for i in 0..50 {
            req.send(vec![i.to_string().into_bytes()]).unwrap();
            let _ = req.recv();
        }
    });

    let publisher = ctx
        .socket(SocketKind::Pub, SocketOptions::builder().bind("inproc://deadlock-seeker-pub").build())
        .unwrap();
    let broadcast = std::thread::spawn(move || {
        for i in 0..50 {
            let _ = publisher.send(vec![i.to_string().into_bytes()]);
        }
    });

    let churn_ctx = ctx.clone();
    let churn = std::thread::spawn(move || {
        for i in 0..20 {
            let addr = format!("inproc://deadlock-seeker-churn-{i}");
            if let Ok(sub) = churn_ctx.socket(
                SocketKind::Sub,
                SocketOptions::builder().bind(addr).subscribe(Vec::new()).build(),
            ) {
                sub.close();
            }
        }
    });

    rep_loop.join().unwrap();
    req_loop.join().unwrap();
    broadcast.join().unwrap();
    churn.join().unwrap();

    assert!(ctx.close());
}
