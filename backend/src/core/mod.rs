//! Core engine primitives

pub mod time;
