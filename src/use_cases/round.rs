// Round-based state machine driven by engine events.
//
// The engine owns ordering and consensus; this side is purely reactive. A
// round begins with `roundStart`, we answer with our provisional move, and
// the round ends when the aggregated `moves` set arrives and is folded into
// the board. `gameOver` is terminal.

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::domain::{CellUpdate, Direction, GridError, GridState};
use crate::interface_adapters::protocol::{EngineEvent, MoveEvent};
use crate::use_cases::types::ClaimedCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    AwaitingRoundStart,
    AwaitingMoves,
    GameOver,
}

pub struct RoundCoordinator {
    local_pid: String,
    phase: RoundPhase,
    round: u32,
    // Direction the input layer currently wants; sampled when a round starts.
    provisional_direction: Direction,
    // Highest round already folded into the board. Guards against the engine
    // re-delivering a moves set it has already sent.
    last_resolved_round: Option<u32>,
    // Cells claimed since the last `take_claimed_cells` call.
    claimed: Vec<ClaimedCell>,
    death_order: Option<Vec<String>>,
    grid: GridState,
}

impl RoundCoordinator {
    pub fn new(local_pid: String, grid: GridState, initial_direction: Direction) -> Self {
        Self {
            local_pid,
            phase: RoundPhase::AwaitingRoundStart,
            round: 0,
            provisional_direction: initial_direction,
            last_resolved_round: None,
            claimed: Vec::new(),
            death_order: None,
            grid,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    /// Elimination order, present once the terminal event has arrived.
    pub fn death_order(&self) -> Option<&[String]> {
        self.death_order.as_deref()
    }

    pub fn set_provisional_direction(&mut self, direction: Direction) {
        self.provisional_direction = direction;
    }

    /// Cells claimed since the previous call, in resolution order.
    pub fn take_claimed_cells(&mut self) -> Vec<ClaimedCell> {
        std::mem::take(&mut self.claimed)
    }

    /// Feeds one engine event through the state machine. Returns the
    /// outbound move to send when the event opens a new round.
    pub fn on_event(&mut self, event: EngineEvent) -> Option<MoveEvent> {
        if self.phase == RoundPhase::GameOver {
            // The channel may deliver trailing packets after termination.
            debug!(event = event.name(), "event after game over ignored");
            return None;
        }
        match event {
            EngineEvent::RoundStart { round, pid } => self.on_round_start(round, &pid),
            EngineEvent::Moves { moves } => {
                self.on_moves(&moves);
                None
            }
            EngineEvent::GameOver {
                pids_in_order_of_death,
            } => {
                info!(order = ?pids_in_order_of_death, "game over");
                self.phase = RoundPhase::GameOver;
                self.death_order = Some(pids_in_order_of_death);
                None
            }
            EngineEvent::Move(mv) => {
                // The engine never addresses a single move at the client;
                // treat an echo as noise rather than a violation.
                debug!(pid = %mv.pid, "stray move event ignored");
                None
            }
        }
    }

    fn on_round_start(&mut self, round: u32, pid: &str) -> Option<MoveEvent> {
        // A repeated round start before the moves arrive is engine retry
        // noise; re-enter the waiting state under the newer round number.
        if self.phase == RoundPhase::AwaitingMoves {
            debug!(round, "round start repeated before moves; re-entering");
        }
        self.round = round;
        self.phase = RoundPhase::AwaitingMoves;

        let Some((x, y)) = self.grid.position_of(&self.local_pid) else {
            error!(pid = %self.local_pid, "local player missing from the board");
            return None;
        };
        let direction = self.provisional_direction;
        let (next_x, next_y) = direction.step(x, y);
        debug!(round, pid, x = next_x, y = next_y, "round start; emitting provisional move");
        Some(MoveEvent {
            x: next_x,
            y: next_y,
            direction,
            pid: self.local_pid.clone(),
            round,
        })
    }

    fn on_moves(&mut self, moves: &[MoveEvent]) {
        // The aggregated set carries the round on each element; the engine
        // guarantees they agree.
        let Some(round) = moves.first().map(|m| m.round) else {
            debug!("empty moves set ignored");
            return;
        };
        if let Some(last) = self.last_resolved_round
            && round <= last
        {
            debug!(round, last, "moves for an already resolved round ignored");
            return;
        }

        let before: HashMap<String, (i32, i32)> = self
            .grid
            .players()
            .map(|(pid, state)| (pid.to_string(), state.position()))
            .collect();

        for mv in moves {
            match self.grid.occupy(mv.x, mv.y, &mv.pid) {
                Ok(CellUpdate::Claimed) => self.claimed.push(ClaimedCell {
                    x: mv.x,
                    y: mv.y,
                    pid: mv.pid.clone(),
                }),
                Ok(CellUpdate::AlreadyOwned) => {}
                Ok(CellUpdate::Conflict { owner }) => {
                    // The engine is authoritative; this should not happen.
                    warn!(
                        x = mv.x,
                        y = mv.y,
                        pid = %mv.pid,
                        owner = %owner,
                        "move targets an owned cell; keeping original owner"
                    );
                }
                Err(GridError::OutOfBounds { x, y }) => {
                    error!(x, y, pid = %mv.pid, "move outside the board; skipping");
                    continue;
                }
            }
            self.grid.set_position(&mv.pid, mv.x, mv.y, mv.direction);
        }

        // A player whose position survived the round unchanged is dead. The
        // game forbids a "stay" move at the input layer, which is what makes
        // this inference sound; keep the rule exactly as is.
        for (pid, position) in &before {
            if self.grid.position_of(pid) == Some(*position) && self.grid.mark_dead(pid) {
                info!(pid = %pid, round, "player eliminated");
            }
        }

        self.last_resolved_round = Some(round);
        self.round = self.round.max(round);
        self.phase = RoundPhase::AwaitingRoundStart;
    }
}
