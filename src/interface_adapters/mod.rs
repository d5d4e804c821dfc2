// Interface adapters: wire protocol and engine transport.

pub mod net;
pub mod protocol;

pub use net::{EngineTransport, TransportError};
pub use protocol::{EngineEvent, MoveEvent, ProtocolError, decode_event, encode_event};
