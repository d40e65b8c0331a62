//! Core trait abstractions for the discovery library.
//!
//! Applications plug search providers in by implementing these.

pub mod backend;
