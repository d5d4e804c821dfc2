use std::{collections::HashMap, env, time::Duration};

use crate::domain::Direction;
use crate::use_cases::{GameSetup, PlayerStart};

// Runtime/client constants (not gameplay tuning).

pub fn udp_port() -> u16 {
    // 0 asks the OS for a free port; the operator hands it to the engine.
    env::var("CYCLE_UDP_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Game construction data normally supplied by the lobby service. The env
/// override exists so the binary can run against a hand-started engine.
pub fn game_setup() -> GameSetup {
    match env::var("CYCLE_SETUP") {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(setup) => setup,
            Err(e) => {
                tracing::warn!(error = %e, "CYCLE_SETUP is not valid JSON; using the default setup");
                default_setup()
            }
        },
        Err(_) => default_setup(),
    }
}

fn default_setup() -> GameSetup {
    let mut starting_positions = HashMap::new();
    starting_positions.insert(
        "1".to_string(),
        PlayerStart {
            x: 100,
            y: 100,
            direction: Direction::Up,
        },
    );
    let mut nicknames = HashMap::new();
    nicknames.insert("1".to_string(), "Player 1".to_string());
    GameSetup {
        local_pid: "1".to_string(),
        starting_positions,
        nicknames,
    }
}

// Capacity of the inbound engine event queue. Deliberately small: the
// engine emits a handful of events per round, and a full queue must stall
// the receive task instead of dropping events.
pub const EVENT_QUEUE_CAPACITY: usize = 20;

pub const WORLD_BROADCAST_CAPACITY: usize = 128;

pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60);
