// Framework bootstrap for the game client runtime.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::{Notify, broadcast, watch};

use crate::domain::Direction;
use crate::frameworks::config;
use crate::interface_adapters::net::EngineTransport;
use crate::use_cases::game::client_task;
use crate::use_cases::{GamePhase, GameSetup, WorldUpdate};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Channels a running game exposes to its collaborators.
#[derive(Clone)]
pub struct GameHandle {
    /// Broadcast source of per-tick world snapshots (renderer subscribes).
    pub world_tx: broadcast::Sender<WorldUpdate>,
    /// Watch receiver for the session phase; delivers the death order.
    pub phase_rx: watch::Receiver<GamePhase>,
    /// The input layer publishes the provisional direction here.
    pub direction_tx: watch::Sender<Direction>,
    /// Tears the game task down.
    pub shutdown: Arc<Notify>,
    /// Local UDP port the engine process must be pointed at.
    pub engine_port: u16,
}

/// Wires up the transport and channels, spawns the game tick task, and
/// returns the collaborator handle. The socket is bound by the caller so
/// tests can use an ephemeral port.
pub fn start_game(socket: UdpSocket, setup: GameSetup) -> std::io::Result<GameHandle> {
    let local_addr = socket.local_addr()?;
    let transport = EngineTransport::new(socket, config::EVENT_QUEUE_CAPACITY);

    let initial_direction = setup
        .starting_positions
        .get(&setup.local_pid)
        .map(|start| start.direction)
        .unwrap_or(Direction::Up);
    let (direction_tx, direction_rx) = watch::channel(initial_direction);
    let (world_tx, _world_rx) = broadcast::channel(config::WORLD_BROADCAST_CAPACITY);
    let (phase_tx, phase_rx) = watch::channel(GamePhase::Running);
    let shutdown = Arc::new(Notify::new());

    // Spawn the game loop; it owns the transport and all board state.
    tokio::spawn(client_task(
        transport,
        setup,
        direction_rx,
        world_tx.clone(),
        phase_tx,
        config::TICK_INTERVAL,
        Arc::clone(&shutdown),
    ));

    tracing::info!(port = local_addr.port(), "udp endpoint ready for peer engine");

    Ok(GameHandle {
        world_tx,
        phase_rx,
        direction_tx,
        shutdown,
        engine_port: local_addr.port(),
    })
}

pub async fn run_with_config() -> std::io::Result<GameHandle> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::udp_port()));

    // Bind the UDP endpoint with error handling
    let socket = UdpSocket::bind(address).await.inspect_err(|e| {
        tracing::error!(%address, error = %e, "failed to bind");
    })?;

    start_game(socket, config::game_setup())
}
