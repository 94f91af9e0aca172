//! External grid (spreadsheet) integration.
//!
//! # Responsibility
//! - Resolve fixed cell coordinates for teams, members and tasks.
//! - Parse the grid into snapshots and write task status back.
//! - Abstract the spreadsheet backend behind `GridClient`.
//!
//! # Invariants
//! - Parser and writer share one layout table and one done-marker rule.
//! - Network backends pace every request through a `RequestPacer`.

pub mod client;
pub mod layout;
pub mod memory;
pub mod parser;
pub mod sheets_api;
pub mod writer;
