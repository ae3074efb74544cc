//! Navigation: turns classified queries into camera moves, pins, and tabs.

mod controller;
mod session;

pub use controller::{NavController, NavError, NavOutcome};
pub use session::{SessionEvent, SessionState, Tab, TabDraft, TabKind};
