//! Competition use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into reconcile, toggle and ranking flows.
//! - Own transaction boundaries for multi-row writes.
//!
//! # Invariants
//! - Only `ledger_service` writes scores or reached-maximum timestamps.

pub mod ledger_service;
pub mod ranking_service;
pub mod reconcile_service;
