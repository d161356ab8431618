//! Linkbot memories
//!
//! `remember <name> is <something>` stores a value, `remember <name>` or
//! `what is <name>` reads it back, `forget <name>` drops it and `memories` lists every name. Names are
//! case-insensitive.

#![deny(unsafe_code, unused_imports, unused_variables)]

pub mod book;
pub mod commands;

pub use book::{parse_remember, MemoryBook, MemoryError};
