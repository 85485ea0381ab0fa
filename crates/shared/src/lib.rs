//! Vocabulary shared between the reader bridge and anything that talks to the
//! rendering surface: marker and location types, themes, font sizes, and the
//! inbound renderer event protocol.

pub mod domain;
pub mod error;
pub mod protocol;
