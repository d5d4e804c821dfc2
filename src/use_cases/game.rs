use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, broadcast, watch};
use tracing::{error, warn};

use crate::domain::{Direction, GridState, GridTuning, PlayerState};
use crate::interface_adapters::net::EngineTransport;
use crate::interface_adapters::protocol::EngineEvent;
use crate::use_cases::round::RoundCoordinator;
use crate::use_cases::types::{GamePhase, GameSetup, PlayerSnapshot, WorldUpdate};

/// The game tick line. Single-threaded owner of all game state: every tick
/// it drains the transport queue, feeds the events through the round state
/// machine, sends whatever move the machine produced, and broadcasts a
/// snapshot for collaborators. All state mutation happens here, so the
/// board needs no locking.
pub async fn client_task(
    mut transport: EngineTransport,
    setup: GameSetup,
    direction_rx: watch::Receiver<Direction>,
    world_tx: broadcast::Sender<WorldUpdate>,
    phase_tx: watch::Sender<GamePhase>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    let mut grid = GridState::new(GridTuning::default());
    for (pid, start) in &setup.starting_positions {
        grid.add_player(
            pid.clone(),
            PlayerState::new(start.x, start.y, start.direction),
        );
    }

    let initial_direction = setup
        .starting_positions
        .get(&setup.local_pid)
        .map(|start| start.direction)
        .unwrap_or(*direction_rx.borrow());
    let mut coordinator =
        RoundCoordinator::new(setup.local_pid.clone(), grid, initial_direction);

    // Drive the reactive state machine at a fixed cadence. The engine sets
    // the round pace; the tick rate only bounds how quickly we notice.
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                // Exit cleanly when the embedding app tears the game down.
                break;
            }
            _ = interval.tick() => {}
        }

        coordinator.set_provisional_direction(*direction_rx.borrow());

        let events = match transport.drain_events() {
            Ok(events) => events,
            Err(e) => {
                error!(error = ?e, "transport unusable; stopping game loop");
                break;
            }
        };

        for event in events {
            if let Some(outbound) = coordinator.on_event(event) {
                if let Err(e) = transport.send(&EngineEvent::Move(outbound)).await {
                    // Non-fatal: the engine re-announces the round if it
                    // never hears from us.
                    warn!(error = ?e, "failed to send move; awaiting next round start");
                }
            }
        }

        let _ = world_tx.send(snapshot(&mut coordinator, &setup));

        if let Some(order) = coordinator.death_order() {
            let _ = phase_tx.send(GamePhase::Over {
                death_order: order.to_vec(),
            });
            break;
        }
    }

    transport.close();
}

fn snapshot(coordinator: &mut RoundCoordinator, setup: &GameSetup) -> WorldUpdate {
    let mut players: Vec<PlayerSnapshot> = coordinator
        .grid()
        .players()
        .map(|(pid, state)| PlayerSnapshot {
            pid: pid.to_string(),
            nickname: setup.nickname(pid),
            x: state.x,
            y: state.y,
            direction: state.direction,
            alive: state.alive,
        })
        .collect();
    // Roster iteration order is arbitrary; keep snapshots deterministic.
    players.sort_by(|a, b| a.pid.cmp(&b.pid));

    WorldUpdate {
        round: coordinator.round(),
        players,
        newly_occupied: coordinator.take_claimed_cells(),
    }
}
