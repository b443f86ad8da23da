//! HTTP surface of the ledger.

pub mod rest;
