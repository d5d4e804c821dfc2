// Fake peer engine for integration tests: a bare UDP socket driven by hand
// so the wire format is asserted from the engine's side of the channel.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

// Generous bound for a test datagram from the client.
const RECV_BUF_LEN: usize = 2048;

pub struct FakeEngine {
    socket: UdpSocket,
    client_addr: SocketAddr,
}

impl FakeEngine {
    /// Binds the engine side on an ephemeral port, targeting the client's
    /// UDP endpoint. The client learns our address from the first datagram
    /// we send.
    pub async fn start(client_port: u16) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("bind fake engine port");
        Self {
            socket,
            client_addr: SocketAddr::from(([127, 0, 0, 1], client_port)),
        }
    }

    pub async fn send(&self, value: &serde_json::Value) {
        let bytes = serde_json::to_vec(value).expect("serialize test datagram");
        self.send_raw(&bytes).await;
    }

    pub async fn send_raw(&self, bytes: &[u8]) {
        self.socket
            .send_to(bytes, self.client_addr)
            .await
            .expect("send datagram to client");
    }

    /// Receives the next datagram from the client as JSON, failing the test
    /// if nothing arrives in time.
    pub async fn recv(&self) -> serde_json::Value {
        let mut buf = vec![0u8; RECV_BUF_LEN];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), self.socket.recv_from(&mut buf))
            .await
            .expect("datagram from client in time")
            .expect("receive datagram from client");
        serde_json::from_slice(&buf[..len]).expect("client datagram is JSON")
    }

    /// Asserts that the client stays quiet for the given window.
    pub async fn expect_silence(&self, window: Duration) {
        let mut buf = vec![0u8; RECV_BUF_LEN];
        let received = tokio::time::timeout(window, self.socket.recv_from(&mut buf)).await;
        assert!(received.is_err(), "client sent a datagram unexpectedly");
    }
}
