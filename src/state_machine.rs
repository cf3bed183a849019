//! Orchestration state machine
//!
//! Elm-style: [`transition`] is pure and returns effects; the runtime
//! executes them and feeds the resulting events back in.

mod effect;
mod event;
mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{AgentState, Outcome, RunContext, FALLBACK_ANSWER};
pub use transition::{transition, TransitionError, MAX_ATTEMPTS};
