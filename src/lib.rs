//! Advisor Sim - Sales-Training Simulation Engine
//!
//! This crate drives simulated sales dialogues between an AI-played bank
//! client and a human advisor trainee: one simulation per trainee, an ordered
//! sequence of conversation stages per product, and a state machine that
//! decides after every exchange whether to advance, finish or abort.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
