//! Game engine: room state, registry, pairing, scoring, timers, and prompt
//! sources. Everything here is transport-agnostic; the server layer wires it
//! to connections and schedules the timers.

pub mod pairing;
pub mod prompts;
pub mod registry;
pub mod room;
pub mod scoring;
pub mod timer;

pub use registry::{Binding, Role, RoomRegistry};
pub use room::{FinaleAnswer, LastLashRound, Player, Prompt, Room};
pub use timer::{ArmedTimer, TimerTask};
