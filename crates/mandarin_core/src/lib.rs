//! Core domain logic for the Mandarin competition tracker.
//! This crate is the single source of truth for scoring invariants.

pub mod access;
pub mod api;
pub mod config;
pub mod db;
pub mod display;
pub mod grid;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use access::{AccessError, CallerId, CapabilityCheck, CheckerAllowList};
pub use api::{ApiError, ApiResult, CompetitionApi, ImportReport, LeaderboardView};
pub use config::{ConfigError, Settings, SheetsCredentials};
pub use db::{open_db, open_db_in_memory, DbError};
pub use display::{DisplayState, LeaderboardDisplay};
pub use grid::client::{GridClient, GridError, RequestPacer};
pub use grid::memory::InMemoryGrid;
pub use grid::sheets_api::SheetsApiClient;
pub use grid::writer::{ReverseSync, SheetWriter};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget, LoggingError,
};
pub use model::entities::{Member, PersonalTask, Team, TeamTask};
pub use model::snapshot::{Snapshot, SnapshotError};
pub use repo::{RepoError, RepoResult};
pub use service::ledger_service::{
    Clock, FixedClock, LedgerPolicy, SyncStatus, SystemClock, ToggleOutcome, ToggleTarget,
};
pub use service::ranking_service::{MemberDetails, MemberStanding, TeamDetails, TeamStanding};
pub use service::reconcile_service::ReconcileStats;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
