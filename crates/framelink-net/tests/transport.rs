//! End-to-end transport behavior over real localhost sockets.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use bytes::BytesMut;
use framelink_frame::{encode_frame, HEADER_SIZE};
use framelink_net::{connect, Config, ConnConfig, Connection, NetError, Request, Server};

fn no_keepalive() -> ConnConfig {
    ConnConfig {
        keepalive_interval: Duration::ZERO,
        ..ConnConfig::default()
    }
}

/// Read one frame straight off a raw socket (header, then payload).
fn read_frame_raw(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut head = [0u8; HEADER_SIZE];
    stream.read_exact(&mut head)?;
    let len = u32::from_be_bytes(head) as usize;
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload)?;
    Ok(payload)
}

fn encoded(payload: &[u8]) -> Vec<u8> {
    let mut wire = BytesMut::new();
    encode_frame(payload, &mut wire).expect("payload should encode");
    wire.to_vec()
}

/// A connected (connection-side, raw-peer) socket pair.
fn pair(config: ConnConfig) -> (Connection, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let addr = listener.local_addr().expect("listener should have an addr");
    let raw = TcpStream::connect(addr).expect("raw peer should connect");
    let (accepted, _) = listener.accept().expect("listener should accept");
    let conn = Connection::open(accepted, config).expect("connection should open");
    (conn, raw)
}

#[test]
fn frame_split_across_5_3_7_byte_reads_arrives_whole() {
    let (conn, mut raw) = pair(no_keepalive());

    let wire = encoded(b"hello world");
    assert_eq!(wire.len(), 15);

    // Header split across the first two chunks, payload across all three.
    for chunk in [&wire[..5], &wire[5..8], &wire[8..]] {
        raw.write_all(chunk).expect("chunk should write");
        raw.flush().expect("chunk should flush");
        thread::sleep(Duration::from_millis(20));
    }

    let payload = conn
        .recv_timeout(Duration::from_secs(5))
        .expect("frame should arrive whole");
    assert_eq!(payload.as_ref(), b"hello world");
    conn.close();
}

#[test]
fn frame_fed_one_byte_at_a_time_yields_one_payload() {
    let (conn, mut raw) = pair(no_keepalive());

    for byte in encoded(b"slow") {
        raw.write_all(&[byte]).expect("byte should write");
        raw.flush().expect("byte should flush");
    }

    let payload = conn
        .recv_timeout(Duration::from_secs(5))
        .expect("frame should assemble");
    assert_eq!(payload.as_ref(), b"slow");

    // Exactly one frame: nothing else is buffered.
    assert!(matches!(conn.try_recv(), Ok(None)));
    conn.close();
}

#[test]
fn coalesced_frames_arrive_in_order() {
    let (conn, mut raw) = pair(no_keepalive());

    let mut wire = Vec::new();
    wire.extend_from_slice(&encoded(b"one"));
    wire.extend_from_slice(&encoded(b"two"));
    wire.extend_from_slice(&encoded(b"three"));
    raw.write_all(&wire).expect("frames should write");
    raw.flush().expect("frames should flush");

    for expected in [&b"one"[..], b"two", b"three"] {
        let payload = conn
            .recv_timeout(Duration::from_secs(5))
            .expect("frame should arrive");
        assert_eq!(payload.as_ref(), expected);
    }
    conn.close();
}

#[test]
fn sends_are_written_in_fifo_order() {
    let (conn, mut raw) = pair(no_keepalive());
    raw.set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout should apply");

    conn.send(&b"A"[..]).expect("A should enqueue");
    conn.send(&b"B"[..]).expect("B should enqueue");
    conn.send(&b"C"[..]).expect("C should enqueue");

    for expected in [&b"A"[..], b"B", b"C"] {
        let payload = read_frame_raw(&mut raw).expect("stub peer should read frame");
        assert_eq!(payload, expected);
    }
    conn.close();
}

#[test]
fn oversized_frame_triggers_overflow_and_closes() {
    let config = ConnConfig {
        buf_len: 16,
        buf_max_len: 64,
        keepalive_interval: Duration::ZERO,
        ..ConnConfig::default()
    };
    let (conn, mut raw) = pair(config);
    raw.set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout should apply");

    // 200-byte payload can never fit a 64-byte buffer.
    raw.write_all(&encoded(&[0xAB; 200]))
        .expect("oversized frame should write");
    raw.flush().expect("oversized frame should flush");

    // Best-effort overflow notice comes back before the socket dies.
    let notice = read_frame_raw(&mut raw).expect("overflow notice should arrive");
    let text = String::from_utf8_lossy(&notice);
    assert!(text.contains("receive buffer full"), "got: {text}");

    // The connection is closed, never a successful decode.
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        match conn.recv_timeout(Duration::from_millis(20)) {
            Err(NetError::Closed) => break,
            Err(NetError::Timeout(_)) => {}
            Ok(payload) => panic!("decoded a frame that should have overflowed: {payload:?}"),
            Err(other) => panic!("unexpected error: {other}"),
        }
        assert!(
            std::time::Instant::now() < deadline,
            "connection did not close on overflow"
        );
    }
}

#[test]
fn keepalive_probes_are_periodic() {
    let config = ConnConfig {
        keepalive_interval: Duration::from_millis(50),
        ..ConnConfig::default()
    };
    let (conn, mut raw) = pair(config);
    raw.set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout should apply");

    // More than one probe proves periodicity, not a one-shot.
    for _ in 0..3 {
        let payload = read_frame_raw(&mut raw).expect("probe should arrive");
        assert_eq!(payload, b"heart beat");
    }
    conn.close();
}

#[test]
fn close_unblocks_a_waiting_receiver() {
    let (conn, _raw) = pair(no_keepalive());
    let conn = std::sync::Arc::new(conn);

    let waiter = {
        let conn = std::sync::Arc::clone(&conn);
        thread::spawn(move || conn.recv_timeout(Duration::from_secs(30)))
    };
    thread::sleep(Duration::from_millis(100));
    conn.close();

    let result = waiter.join().expect("waiter should not panic");
    assert!(matches!(result, Err(NetError::Closed)));
}

#[test]
fn server_answers_ping_with_pong() {
    let config = Config::new("127.0.0.1:0");
    let server = Server::bind(&config).expect("server should bind");
    let addr = server.local_addr().expect("server should have an addr");
    thread::spawn(move || {
        let _ = server.serve();
    });

    let conn = connect(addr, no_keepalive()).expect("client should connect");
    let ping = Request::new("ping", Vec::new())
        .to_bytes()
        .expect("request should serialize");
    conn.send(ping).expect("ping should enqueue");

    let reply = conn
        .recv_timeout(Duration::from_secs(5))
        .expect("pong should arrive");
    assert_eq!(reply.as_ref(), b"pong");
    conn.close();
}

#[test]
fn server_rejects_unknown_command() {
    let config = Config::new("127.0.0.1:0");
    let server = Server::bind(&config).expect("server should bind");
    let addr = server.local_addr().expect("server should have an addr");
    thread::spawn(move || {
        let _ = server.serve();
    });

    let conn = connect(addr, no_keepalive()).expect("client should connect");
    let req = Request::new("flush", Vec::new())
        .to_bytes()
        .expect("request should serialize");
    conn.send(req).expect("request should enqueue");

    let reply = conn
        .recv_timeout(Duration::from_secs(5))
        .expect("reply should arrive");
    assert_eq!(reply.as_ref(), b"unknown command: flush");
    conn.close();
}

#[test]
fn server_swallows_keepalive_probes() {
    let config = Config::new("127.0.0.1:0");
    let server = Server::bind(&config).expect("server should bind");
    let addr = server.local_addr().expect("server should have an addr");
    thread::spawn(move || {
        let _ = server.serve();
    });

    let client_config = ConnConfig {
        keepalive_interval: Duration::from_millis(50),
        ..ConnConfig::default()
    };
    let conn = connect(addr, client_config).expect("client should connect");

    // Probes get no reply; a real command still does.
    thread::sleep(Duration::from_millis(200));
    let ping = Request::new("ping", Vec::new())
        .to_bytes()
        .expect("request should serialize");
    conn.send(ping).expect("ping should enqueue");

    let reply = conn
        .recv_timeout(Duration::from_secs(5))
        .expect("pong should arrive");
    assert_eq!(reply.as_ref(), b"pong");
    conn.close();
}
