//! # Domain Layer
//!
//! Trades, settlements, and the rules that pair them.
//!
//! Nothing in this layer performs I/O; persistence and orchestration live in
//! the infrastructure and application layers.

pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;
