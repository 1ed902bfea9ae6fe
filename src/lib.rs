//! Battle odds calculator.
//!
//! Exposes the game model, the battle engine, the parallel calculator and
//! scenario loading for use by integration tests and the binary entry point.

pub mod battle;
pub mod calculator;
pub mod game;
pub mod scenario;
