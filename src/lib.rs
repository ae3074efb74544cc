//! AtlasIQ: a travel-exploration engine.
//!
//! Free-text queries are normalized, classified, and resolved to places
//! through a static-first fallback chain (continent table, country gazetteer,
//! remote AI). A navigation controller turns resolutions into globe camera
//! moves, pins, and deduplicated exploration tabs.

pub mod cache;
pub mod collab;
pub mod config;
pub mod gazetteer;
pub mod globe;
pub mod nav;
pub mod providers;
pub mod query;
pub mod recommend;
pub mod resolver;
pub mod server;

pub use collab::{Collaborators, DeviceError, RemoteError};
pub use gazetteer::{Gazetteer, Place};
pub use nav::{NavController, NavError, NavOutcome, SessionState, Tab};
pub use query::{classify, normalize, QueryIntent};
pub use resolver::{PlaceResolver, Resolution};
