//! Client-side session handling.
//!
//! `SessionStore` is the port to wherever the session lives (a file for the
//! terminal client); `AuthEventBus` carries its change feed; `SessionGate` is
//! the per-view state machine that decides whether a view may render.

pub mod bus;
pub mod gate;
pub mod store;

pub use bus::AuthEventBus;
pub use gate::{GateState, Route, SessionGate};
pub use store::SessionStore;
