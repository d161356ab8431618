//! Linkbot link triggers
//!
//! Listens for trigger phrases or regular expressions in chat and replies with
//! one of the links registered for the trigger.
//!
//! ## Writing triggers
//!
//! - `ship it` is a phrase: case-insensitive, and any run of whitespace in a
//!   message matches the single space in the phrase
//! - `/(complex|inscrutable) phrase/i` is a regex; flags `a`, `i`, `m`, `s`
//!   and `x` may follow the closing slash
//!
//! Several links may be registered for one trigger; one is picked at random
//! for each reply.

#![deny(unsafe_code, unused_imports, unused_variables)]

pub mod commands;
pub mod error;
pub mod pattern;
pub mod store;
pub mod trigger;

pub use error::LinkError;
pub use pattern::{canonical_key, Pattern, RegexFlag};
pub use store::TriggerStore;
pub use trigger::Trigger;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{LinkError, Pattern, TriggerStore};
}
