// Wire protocol for the local UDP channel to the peer engine.
//
// Every datagram is one JSON object of the shape
// `{ "eventName": "<tag>", "<tag>": <payload> }`. The payload field is named
// by the discriminant, so decoding is two-step: read `eventName`, then decode
// the field it points at into the matching variant.

use serde::{Deserialize, Serialize};

use crate::domain::Direction;

/// Errors raised while encoding or decoding datagrams. All of them are
/// recoverable: the packet is logged and dropped, and the channel keeps
/// going.
#[derive(Debug)]
pub enum ProtocolError {
    Encode(serde_json::Error),
    Decode(serde_json::Error),
    /// The envelope has no `eventName` discriminant.
    MissingEventName,
    /// The envelope names a payload field that is not present.
    MissingPayload(&'static str),
    /// The discriminant is not one of the known event kinds.
    UnknownEvent(String),
}

/// One player's move for one round. Doubles as the outbound `myMove`
/// payload and as the element type of the aggregated `moves` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEvent {
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub pid: String,
    pub round: u32,
}

/// Everything that travels over the engine channel, in either direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine → client: a new round has begun.
    RoundStart { round: u32, pid: String },
    /// Client → engine: the local player's provisional move. The engine
    /// never addresses one of these back at the client.
    Move(MoveEvent),
    /// Engine → client: the authoritative move set for a round, in the
    /// engine's resolution order. Order matters downstream.
    Moves { moves: Vec<MoveEvent> },
    /// Engine → client: terminal event, earliest-eliminated first.
    GameOver { pids_in_order_of_death: Vec<String> },
}

impl EngineEvent {
    /// The wire discriminant for this event.
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::RoundStart { .. } => "roundStart",
            EngineEvent::Move(_) => "myMove",
            EngineEvent::Moves { .. } => "moves",
            EngineEvent::GameOver { .. } => "gameOver",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RoundStartPayload {
    round: u32,
    pid: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GameOverPayload {
    #[serde(rename = "pidsInOrderOfDeath")]
    pids_in_order_of_death: Vec<String>,
}

pub fn encode_event(event: &EngineEvent) -> Result<Vec<u8>, ProtocolError> {
    let payload = match event {
        EngineEvent::RoundStart { round, pid } => serde_json::to_value(RoundStartPayload {
            round: *round,
            pid: pid.clone(),
        }),
        EngineEvent::Move(mv) => serde_json::to_value(mv),
        EngineEvent::Moves { moves } => serde_json::to_value(moves),
        EngineEvent::GameOver {
            pids_in_order_of_death,
        } => serde_json::to_value(GameOverPayload {
            pids_in_order_of_death: pids_in_order_of_death.clone(),
        }),
    }
    .map_err(ProtocolError::Encode)?;

    let mut envelope = serde_json::Map::new();
    envelope.insert(
        "eventName".to_string(),
        serde_json::Value::String(event.name().to_string()),
    );
    envelope.insert(event.name().to_string(), payload);
    serde_json::to_vec(&serde_json::Value::Object(envelope)).map_err(ProtocolError::Encode)
}

pub fn decode_event(bytes: &[u8]) -> Result<EngineEvent, ProtocolError> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(ProtocolError::Decode)?;
    let name = value
        .get("eventName")
        .and_then(|v| v.as_str())
        .ok_or(ProtocolError::MissingEventName)?;

    match name {
        "roundStart" => {
            let p: RoundStartPayload = decode_payload(&value, "roundStart")?;
            Ok(EngineEvent::RoundStart {
                round: p.round,
                pid: p.pid,
            })
        }
        "myMove" => Ok(EngineEvent::Move(decode_payload(&value, "myMove")?)),
        "moves" => Ok(EngineEvent::Moves {
            moves: decode_payload(&value, "moves")?,
        }),
        "gameOver" => {
            let p: GameOverPayload = decode_payload(&value, "gameOver")?;
            Ok(EngineEvent::GameOver {
                pids_in_order_of_death: p.pids_in_order_of_death,
            })
        }
        other => Err(ProtocolError::UnknownEvent(other.to_string())),
    }
}

fn decode_payload<T: serde::de::DeserializeOwned>(
    envelope: &serde_json::Value,
    name: &'static str,
) -> Result<T, ProtocolError> {
    let payload = envelope
        .get(name)
        .cloned()
        .ok_or(ProtocolError::MissingPayload(name))?;
    serde_json::from_value(payload).map_err(ProtocolError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_move(pid: &str, x: i32, y: i32) -> MoveEvent {
        MoveEvent {
            x,
            y,
            direction: Direction::Up,
            pid: pid.to_string(),
            round: 1,
        }
    }

    #[test]
    fn round_start_decodes_from_envelope() {
        let bytes = br#"{"eventName":"roundStart","roundStart":{"round":3,"pid":"2"}}"#;
        let event = decode_event(bytes).unwrap();
        assert_eq!(
            event,
            EngineEvent::RoundStart {
                round: 3,
                pid: "2".to_string()
            }
        );
    }

    #[test]
    fn my_move_encodes_with_discriminant_and_named_payload() {
        let event = EngineEvent::Move(sample_move("1", 5, 4));
        let bytes = encode_event(&event).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["eventName"], "myMove");
        assert_eq!(
            value["myMove"],
            json!({"x": 5, "y": 4, "direction": "UP", "pid": "1", "round": 1})
        );
    }

    #[test]
    fn moves_payload_is_a_bare_array_and_order_is_preserved() {
        let event = EngineEvent::Moves {
            moves: vec![
                sample_move("3", 1, 1),
                sample_move("1", 5, 4),
                sample_move("2", 7, 7),
            ],
        };
        let bytes = encode_event(&event).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(value["moves"].is_array());

        let decoded = decode_event(&bytes).unwrap();
        let EngineEvent::Moves { moves } = decoded else {
            panic!("expected moves event");
        };
        let pids: Vec<&str> = moves.iter().map(|m| m.pid.as_str()).collect();
        assert_eq!(pids, ["3", "1", "2"]);
    }

    #[test]
    fn game_over_round_trips() {
        let event = EngineEvent::GameOver {
            pids_in_order_of_death: vec!["2".to_string(), "3".to_string(), "1".to_string()],
        };
        let bytes = encode_event(&event).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["eventName"], "gameOver");
        assert_eq!(value["gameOver"]["pidsInOrderOfDeath"], json!(["2", "3", "1"]));

        assert_eq!(decode_event(&bytes).unwrap(), event);
    }

    #[test]
    fn every_variant_round_trips() {
        let events = [
            EngineEvent::RoundStart {
                round: 1,
                pid: "1".to_string(),
            },
            EngineEvent::Move(sample_move("1", 5, 4)),
            EngineEvent::Moves {
                moves: vec![sample_move("1", 5, 4), sample_move("2", 7, 7)],
            },
            EngineEvent::GameOver {
                pids_in_order_of_death: vec!["2".to_string(), "1".to_string()],
            },
        ];
        for event in events {
            let bytes = encode_event(&event).unwrap();
            assert_eq!(decode_event(&bytes).unwrap(), event);
        }
    }

    #[test]
    fn unknown_discriminant_is_rejected() {
        let bytes = br#"{"eventName":"unknown","unknown":{}}"#;
        let err = decode_event(bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownEvent(name) if name == "unknown"));
    }

    #[test]
    fn missing_discriminant_is_rejected() {
        let err = decode_event(br#"{"round": 1}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingEventName));
    }

    #[test]
    fn missing_payload_is_rejected() {
        let err = decode_event(br#"{"eventName":"roundStart"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingPayload("roundStart")));
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let bytes = br#"{"eventName":"roundStart","roundStart":{"round":"three","pid":"2"}}"#;
        assert!(matches!(
            decode_event(bytes).unwrap_err(),
            ProtocolError::Decode(_)
        ));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(matches!(
            decode_event(b"not json at all").unwrap_err(),
            ProtocolError::Decode(_)
        ));
    }
}
