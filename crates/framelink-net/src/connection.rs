use std::io::Write;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use framelink_frame::{encode_frame, extract_frame, peek_header, RecvBuffer, MAX_FRAME_PAYLOAD};
use tracing::{debug, warn};

use crate::config::ConnConfig;
use crate::error::{NetError, Result};

/// Fixed liveness payload sent by the keep-alive thread.
pub const KEEPALIVE_PAYLOAD: &[u8] = b"heart beat";

const STATE_OPEN: u8 = 0;
const STATE_CLOSING: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// Connection lifecycle state. Terminal state is `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Open,
    Closing,
    Closed,
}

/// State shared by the worker threads and the caller-facing handle.
///
/// The atomic state is the single source of truth for "closed": every
/// enqueue checks it, so no thread ever pushes into a queue whose consumer
/// has given up.
#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    stream: TcpStream,
}

impl Shared {
    fn state(&self) -> State {
        match self.state.load(Ordering::Acquire) {
            STATE_OPEN => State::Open,
            STATE_CLOSING => State::Closing,
            _ => State::Closed,
        }
    }

    fn is_open(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_OPEN
    }

    /// Transition Open -> Closing. Returns false when another caller got
    /// there first (double-close is a no-op).
    fn begin_close(&self) -> bool {
        self.state
            .compare_exchange(
                STATE_OPEN,
                STATE_CLOSING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    fn finish_close(&self) {
        self.state.store(STATE_CLOSED, Ordering::Release);
    }
}

enum Outbound {
    Frame(Bytes),
    Shutdown,
}

/// A framed TCP connection.
///
/// Owns the socket, a receive buffer, and two queues. Three worker threads
/// run per connection:
///
/// - read thread: socket -> receive buffer -> complete frames -> inbound queue
/// - write thread: outbound queue -> encoded frames -> socket
/// - keep-alive thread (optional): periodic liveness probe via the outbound path
///
/// The receive buffer and socket reads belong exclusively to the read thread;
/// callers interact only through [`send`], [`recv_timeout`], [`try_recv`] and
/// [`close`]. Socket failures and buffer overflow close this connection only,
/// never the process.
///
/// [`send`]: Connection::send
/// [`recv_timeout`]: Connection::recv_timeout
/// [`try_recv`]: Connection::try_recv
/// [`close`]: Connection::close
#[derive(Debug)]
pub struct Connection {
    shared: Arc<Shared>,
    outbound_tx: SyncSender<Outbound>,
    inbound_rx: Mutex<Receiver<Bytes>>,
}

impl Connection {
    /// Wrap an established socket and start the worker threads. Does not
    /// block the caller.
    pub fn open(stream: TcpStream, config: ConnConfig) -> std::io::Result<Self> {
        let read_stream = stream.try_clone()?;
        let write_stream = stream.try_clone()?;
        let shared = Arc::new(Shared {
            state: AtomicU8::new(STATE_OPEN),
            stream,
        });

        let (outbound_tx, outbound_rx) = mpsc::sync_channel(config.queue_depth);
        let (inbound_tx, inbound_rx) = mpsc::sync_channel(config.queue_depth);

        {
            let shared = Arc::clone(&shared);
            let outbound_tx = outbound_tx.clone();
            let buffer = RecvBuffer::new(config.buf_len, config.buf_max_len);
            let inbound_tx = inbound_tx.clone();
            thread::Builder::new()
                .name("conn-read".into())
                .spawn(move || run_read(read_stream, buffer, inbound_tx, outbound_tx, shared))?;
        }
        {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("conn-write".into())
                .spawn(move || run_write(write_stream, outbound_rx, inbound_tx, shared))?;
        }
        if config.keepalive_interval > Duration::ZERO {
            let shared = Arc::clone(&shared);
            let outbound_tx = outbound_tx.clone();
            let interval = config.keepalive_interval;
            thread::Builder::new()
                .name("conn-keepalive".into())
                .spawn(move || run_keepalive(shared, outbound_tx, interval))?;
        }

        Ok(Self {
            shared,
            outbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.shared.state()
    }

    /// Enqueue a payload for asynchronous transmission.
    ///
    /// Fails immediately with [`NetError::Closed`] once the connection is
    /// shutting down. Blocks for queue space when the outbound queue is full,
    /// applying backpressure to the producer.
    pub fn send(&self, payload: impl Into<Bytes>) -> Result<()> {
        let payload = payload.into();
        if payload.len() > MAX_FRAME_PAYLOAD {
            return Err(framelink_frame::FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_FRAME_PAYLOAD,
            }
            .into());
        }
        if !self.shared.is_open() {
            return Err(NetError::Closed);
        }
        self.outbound_tx
            .send(Outbound::Frame(payload))
            .map_err(|_| NetError::Closed)
    }

    /// Dequeue one complete inbound payload, waiting up to `timeout`.
    ///
    /// Returns [`NetError::Timeout`] when nothing arrives in time (retryable)
    /// and [`NetError::Closed`] once the connection has shut down. For a
    /// non-blocking poll use [`try_recv`]; a zero `timeout` here reports
    /// `Timeout` unless a payload is already queued.
    ///
    /// [`try_recv`]: Connection::try_recv
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Bytes> {
        if !self.shared.is_open() {
            return Err(NetError::Closed);
        }
        let rx = self.inbound_rx.lock().unwrap_or_else(|e| e.into_inner());
        match rx.recv_timeout(timeout) {
            Ok(payload) => Ok(payload),
            Err(RecvTimeoutError::Timeout) => Err(NetError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(NetError::Closed),
        }
    }

    /// Return an already-queued inbound payload, or `None` without blocking.
    pub fn try_recv(&self) -> Result<Option<Bytes>> {
        if !self.shared.is_open() {
            return Err(NetError::Closed);
        }
        let rx = self.inbound_rx.lock().unwrap_or_else(|e| e.into_inner());
        match rx.try_recv() {
            Ok(payload) => Ok(Some(payload)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(NetError::Closed),
        }
    }

    /// Shut the connection down.
    ///
    /// Idempotent and safe to call concurrently with `send`/`recv` from any
    /// thread, including the worker threads themselves. Wakes the write
    /// thread with a shutdown sentinel and unblocks the read thread by
    /// shutting the socket down; blocked callers observe [`NetError::Closed`]
    /// once the workers drop their queue handles.
    pub fn close(&self) {
        shutdown(&self.shared, &self.outbound_tx);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

/// The one close path. Only the thread that wins the Open -> Closing race
/// does the work; everyone else returns immediately.
///
/// `Closed` is stored only after the shutdown sentinel is enqueued and the
/// socket is shut down, so a caller that reads `Closed` can rely on both
/// teardown signals having been issued. The worker threads drain on their
/// own after that: this runs on a worker thread whenever the read loop
/// initiates the close, so joining them here would deadlock. Callers never
/// observe the lag because every queue operation checks the state first.
fn shutdown(shared: &Shared, outbound_tx: &SyncSender<Outbound>) {
    if !shared.begin_close() {
        return;
    }
    // Best effort: a full queue means the write thread is awake and will
    // notice the state change on its next dequeue.
    let _ = outbound_tx.try_send(Outbound::Shutdown);
    if let Err(err) = shared.stream.shutdown(Shutdown::Both) {
        debug!(error = %err, "socket shutdown");
    }
    shared.finish_close();
}

/// Read thread: refill the receive buffer from the socket, then drain every
/// complete frame into the inbound queue.
fn run_read(
    mut stream: TcpStream,
    mut buffer: RecvBuffer,
    inbound_tx: SyncSender<Bytes>,
    outbound_tx: SyncSender<Outbound>,
    shared: Arc<Shared>,
) {
    'outer: loop {
        buffer.compact();
        if let Err(err) = buffer.ensure_capacity() {
            warn!(error = %err, "receive buffer overflow, closing connection");
            notify_peer(&mut stream, &err.to_string());
            break;
        }
        match buffer.fill_from(&mut stream) {
            Ok(0) => {
                debug!("peer closed the stream");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                // Expected when close() shut the socket down under us.
                if shared.is_open() {
                    warn!(error = %err, "socket read failed");
                }
                break;
            }
        }
        loop {
            let payload_len = match peek_header(&buffer) {
                Ok(len) => len as usize,
                // Header split across reads; wait for more bytes.
                Err(_) => break,
            };
            match extract_frame(&mut buffer, payload_len) {
                Ok(Some(payload)) => {
                    if !deliver_inbound(&inbound_tx, &shared, payload) {
                        break 'outer;
                    }
                }
                // Payload not fully buffered yet.
                Ok(None) | Err(_) => break,
            }
        }
    }
    shutdown(&shared, &outbound_tx);
}

/// Push a decoded payload onto the inbound queue, blocking for space when
/// the consumer lags (backpressure) but re-checking the connection state so
/// a close never strands the read thread. Returns false once the connection
/// is going away.
fn deliver_inbound(inbound_tx: &SyncSender<Bytes>, shared: &Shared, payload: Bytes) -> bool {
    let mut payload = payload;
    loop {
        if !shared.is_open() {
            return false;
        }
        match inbound_tx.try_send(payload) {
            Ok(()) => return true,
            Err(TrySendError::Full(back)) => {
                payload = back;
                thread::sleep(Duration::from_millis(10));
            }
            Err(TrySendError::Disconnected(_)) => return false,
        }
    }
}

/// Write thread: dequeue payloads in FIFO order and write each as one frame.
fn run_write(
    mut stream: TcpStream,
    outbound_rx: Receiver<Outbound>,
    inbound_tx: SyncSender<Bytes>,
    shared: Arc<Shared>,
) {
    while let Ok(msg) = outbound_rx.recv() {
        let payload = match msg {
            Outbound::Shutdown => break,
            Outbound::Frame(payload) => payload,
        };
        if !shared.is_open() {
            break;
        }
        let mut wire = BytesMut::new();
        if let Err(err) = encode_frame(&payload, &mut wire) {
            report_write_failure(&inbound_tx, &shared, &err.to_string());
            continue;
        }
        if let Err(err) = stream.write_all(&wire).and_then(|()| stream.flush()) {
            report_write_failure(&inbound_tx, &shared, &err.to_string());
        }
    }
}

/// A write failed after the producer's `send` already returned. There is no
/// way to correlate the failure with that call, so the report rides the
/// inbound path while it is still open, and falls back to the log.
fn report_write_failure(inbound_tx: &SyncSender<Bytes>, shared: &Shared, message: &str) {
    if shared.is_open() && inbound_tx.try_send(Bytes::from(message.to_owned())).is_ok() {
        return;
    }
    warn!(error = message, "frame write failed");
}

/// Keep-alive thread: periodic liveness probe through the outbound path.
/// Send failure is logged, never fatal.
fn run_keepalive(shared: Arc<Shared>, outbound_tx: SyncSender<Outbound>, interval: Duration) {
    loop {
        // Nap in short steps so a closed connection is noticed promptly.
        let mut remaining = interval;
        while remaining > Duration::ZERO {
            let nap = remaining.min(Duration::from_secs(1));
            thread::sleep(nap);
            if !shared.is_open() {
                return;
            }
            remaining = remaining.saturating_sub(nap);
        }
        match outbound_tx.try_send(Outbound::Frame(Bytes::from_static(KEEPALIVE_PAYLOAD))) {
            Ok(()) => debug!("keep-alive sent"),
            Err(TrySendError::Full(_)) => {
                debug!("keep-alive skipped, outbound queue full");
            }
            Err(TrySendError::Disconnected(_)) => return,
        }
    }
}

/// Best-effort direct frame write, bypassing the outbound queue. Used to tell
/// the peer why its connection is going away when the queue path is no longer
/// trustworthy.
fn notify_peer(stream: &mut TcpStream, message: &str) {
    let mut wire = BytesMut::new();
    if encode_frame(message.as_bytes(), &mut wire).is_ok() {
        let _ = stream.write_all(&wire);
    }
}
