//! Domain models for the intent service.
//!
//! # Core Concepts
//!
//! - [`Intent`]: A stated commitment from an engineer, with the context it was
//!   made in, the outcome it expects and the people it involves.
//! - [`Goal`]: A chapter-level objective that intents work towards, carrying
//!   a clarity statement and several tag sets that bound how it is pursued.
//!
//! Both entities are created, fully replaced and deleted through their
//! repositories; there is no soft delete or versioning. Tag sets (collaborators,
//! constraints, success criteria, guardrails, decision rights) are ordered,
//! case-insensitively unique lists of short strings.

mod goal;
mod intent;
mod page;

pub use goal::*;
pub use intent::*;
pub use page::*;
