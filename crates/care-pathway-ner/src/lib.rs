//! Prompted named-entity recognition for the condition resolver.
//!
//! Plugs into the resolver's optional entity stage. The completion backend
//! is injected as a function so any model runtime can drive it.

pub mod prompts;
pub mod extraction;

pub use extraction::*;
pub use prompts::*;
