pub mod helpers;
pub mod local_transport;
pub mod test_protocol;

pub use helpers::*;
pub use local_transport::LocalTransport;
pub use test_protocol::{protocol, PAWN, RELIC, SCORE, SCOREBOARD, SET_SCORE, TAUNT};
