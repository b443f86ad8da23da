//! # Application Layer
//!
//! Use cases over the domain model and the persistence ports.

pub mod error;
pub mod services;

pub use error::{ApplicationError, ApplicationResult, InfrastructureError};
