//! Query understanding: normalization, intent classification, gibberish guard.

mod classify;
mod gibberish;
mod normalize;

pub use classify::{classify, QueryIntent};
pub use gibberish::looks_like_gibberish;
pub use normalize::normalize;
