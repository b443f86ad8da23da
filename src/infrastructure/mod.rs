//! # Infrastructure Layer
//!
//! Adapters for storage backends.

pub mod persistence;
