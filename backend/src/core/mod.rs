//! Core infrastructure shared by every simulation component.

pub mod time;
