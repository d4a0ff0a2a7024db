//! HTTP adapters.

pub mod simulation;
