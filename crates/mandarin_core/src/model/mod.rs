//! Competition domain model.
//!
//! # Responsibility
//! - Define persisted entities (teams, members, their tasks).
//! - Define the snapshot exchange shape produced by the grid parser.
//!
//! # Invariants
//! - Teams are keyed by `number`; members by `(team, first_name, last_name)`;
//!   tasks by `(owner, task_number)`.
//! - Score fields are only mutated by the score ledger.

pub mod entities;
pub mod snapshot;
