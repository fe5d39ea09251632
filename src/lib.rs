//! Pushkontak — WhatsApp group broadcast backend.
//!
//! Single Rust binary. Maintains one authenticated WhatsApp session through
//! an external bridge, lists groups, broadcasts a message to every member of
//! a group with randomized pacing, and archives group rosters as saved
//! contacts.
//!
//! See `DESIGN.md` for full architecture documentation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bot;
pub mod config;
pub mod http;
pub mod logging;
pub mod store;
pub mod whatsapp;
