pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use frameworks::client::{GameHandle, run_with_config, start_game};
pub use frameworks::config::udp_port;
