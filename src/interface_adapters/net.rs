// UDP channel to the peer engine process.
//
// The transport owns one socket and a dedicated receive task. The engine's
// address is not configured anywhere; it is learned from the source of the
// first inbound datagram and kept for the rest of the session. Decoded
// events cross from the receive task to the game tick over a bounded
// channel, which is the only shared state between the two.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::interface_adapters::protocol::{EngineEvent, ProtocolError, decode_event, encode_event};

// Largest datagram the engine is expected to emit.
const MAX_DATAGRAM_LEN: usize = 2048;

#[derive(Debug)]
pub enum TransportError {
    // Categorizes send/receive failures so callers can decide policy.
    /// No inbound datagram has arrived yet, so there is nowhere to send.
    PeerUnknown,
    /// The transport has been torn down; callers should stop using it.
    Closed,
    Encode(ProtocolError),
    Io(std::io::Error),
}

pub struct EngineTransport {
    socket: Arc<UdpSocket>,
    peer_addr: Arc<OnceLock<SocketAddr>>,
    events_rx: mpsc::Receiver<EngineEvent>,
    recv_task: JoinHandle<()>,
    closed: bool,
}

impl EngineTransport {
    /// Wraps a bound socket and starts the receive task. `queue_capacity`
    /// bounds the inbound event queue; when the game tick stops draining,
    /// the receive task blocks on the full queue rather than dropping
    /// events.
    pub fn new(socket: UdpSocket, queue_capacity: usize) -> Self {
        let socket = Arc::new(socket);
        let peer_addr = Arc::new(OnceLock::new());
        let (events_tx, events_rx) = mpsc::channel(queue_capacity);
        let recv_task = tokio::spawn(recv_loop(
            Arc::clone(&socket),
            Arc::clone(&peer_addr),
            events_tx,
        ));
        Self {
            socket,
            peer_addr,
            events_rx,
            recv_task,
            closed: false,
        }
    }

    /// The locally bound address. The operator hands the port to the engine
    /// process at startup.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// The engine address learned from the first inbound datagram, if any.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr.get().copied()
    }

    /// Removes and returns all queued events in arrival order. Non-blocking;
    /// called once per game tick.
    pub fn drain_events(&mut self) -> Result<Vec<EngineEvent>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            events.push(event);
        }
        Ok(events)
    }

    /// Encodes and sends one event to the learned engine address. Send
    /// failures are non-fatal for the session: the next round start gives
    /// the caller a natural retry.
    pub async fn send(&self, event: &EngineEvent) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let peer = self.peer_addr().ok_or(TransportError::PeerUnknown)?;
        let bytes = encode_event(event).map_err(TransportError::Encode)?;
        self.socket
            .send_to(&bytes, peer)
            .await
            .map_err(TransportError::Io)?;
        Ok(())
    }

    /// Tears the transport down. The receive task is aborted, which returns
    /// a blocked receive promptly; every later operation fails fast with
    /// `TransportError::Closed`.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.recv_task.abort();
        self.events_rx.close();
    }
}

impl Drop for EngineTransport {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

async fn recv_loop(
    socket: Arc<UdpSocket>,
    peer_addr: Arc<OnceLock<SocketAddr>>,
    events_tx: mpsc::Sender<EngineEvent>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!(error = %e, "udp receive error");
                continue;
            }
        };

        if peer_addr.set(from).is_ok() {
            info!(peer = %from, "engine address learned from first datagram");
        }

        let event = match decode_event(&buf[..len]) {
            Ok(event) => event,
            Err(e) => {
                // Fail closed: malformed datagrams are dropped, the loop
                // keeps serving the ones that follow.
                warn!(error = ?e, bytes = len, "dropping malformed datagram");
                continue;
            }
        };

        // Awaiting on a full queue is deliberate back-pressure: a stalled
        // consumer should stall the socket, not silently lose events.
        if events_tx.send(event).await.is_err() {
            debug!("event queue closed; receive loop exiting");
            break;
        }
    }
}
