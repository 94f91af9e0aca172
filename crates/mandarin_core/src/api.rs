//! Request-handling boundary.
//!
//! # Responsibility
//! - Expose competition use cases to outer shells (CLI, bots, HTTP).
//! - Apply the checker capability to organizer-only operations.
//! - Wire the ledger to the configured reverse sync and clock.
//!
//! # Invariants
//! - Grid parsing, snapshot import and display changes require a checker.
//! - Task toggles and read queries are open to every caller.
//! - A hidden leaderboard returns no rows until its reveal time.

use crate::access::{require_checker, AccessError, CallerId, CapabilityCheck};
use crate::display::{DisplayState, LeaderboardDisplay};
use crate::grid::client::{GridClient, GridError};
use crate::grid::parser::SnapshotParser;
use crate::grid::writer::ReverseSync;
use crate::model::entities::{MemberId, PersonalTaskId, TeamTaskId};
use crate::model::snapshot::{Snapshot, SnapshotError};
use crate::repo::display_repo::{DisplayRepository, SqliteDisplayRepository};
use crate::repo::member_repo::SqliteMemberRepository;
use crate::repo::team_repo::SqliteTeamRepository;
use crate::repo::RepoError;
use crate::service::ledger_service::{
    Clock, LedgerError, LedgerPolicy, LedgerService, SystemClock, ToggleOutcome,
};
use crate::service::ranking_service::{
    MemberDetails, MemberStanding, RankingError, RankingService, TeamDetails, TeamStanding,
};
use crate::service::reconcile_service::{ReconcileError, ReconcileService, ReconcileStats};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    Access(AccessError),
    Grid(GridError),
    Snapshot(SnapshotError),
    Repo(RepoError),
    Reconcile(ReconcileError),
    Ledger(LedgerError),
    Ranking(RankingError),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access(err) => write!(f, "{err}"),
            Self::Grid(err) => write!(f, "grid error: {err}"),
            Self::Snapshot(err) => write!(f, "invalid snapshot: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Reconcile(err) => write!(f, "{err}"),
            Self::Ledger(err) => write!(f, "{err}"),
            Self::Ranking(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Access(err) => Some(err),
            Self::Grid(err) => Some(err),
            Self::Snapshot(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Reconcile(err) => Some(err),
            Self::Ledger(err) => Some(err),
            Self::Ranking(err) => Some(err),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(value: AccessError) -> Self {
        Self::Access(value)
    }
}

impl From<GridError> for ApiError {
    fn from(value: GridError) -> Self {
        Self::Grid(value)
    }
}

impl From<SnapshotError> for ApiError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ReconcileError> for ApiError {
    fn from(value: ReconcileError) -> Self {
        Self::Reconcile(value)
    }
}

impl From<LedgerError> for ApiError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

impl From<RankingError> for ApiError {
    fn from(value: RankingError) -> Self {
        Self::Ranking(value)
    }
}

/// Public leaderboard response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardView {
    pub visible: bool,
    pub display: DisplayState,
    pub rows: Vec<TeamStanding>,
}

/// Outcome of a parse followed by reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub snapshot: Snapshot,
    pub stats: ReconcileStats,
}

/// Competition use cases bound to one store connection.
pub struct CompetitionApi<'a> {
    conn: &'a Connection,
    access: &'a dyn CapabilityCheck,
    display: &'a LeaderboardDisplay,
    sync: Option<&'a dyn ReverseSync>,
    clock: &'a dyn Clock,
    policy: LedgerPolicy,
}

impl<'a> CompetitionApi<'a> {
    pub fn new(
        conn: &'a Connection,
        access: &'a dyn CapabilityCheck,
        display: &'a LeaderboardDisplay,
    ) -> Self {
        Self {
            conn,
            access,
            display,
            sync: None,
            clock: &SystemClock,
            policy: LedgerPolicy::default(),
        }
    }

    pub fn with_reverse_sync(mut self, sync: &'a dyn ReverseSync) -> Self {
        self.sync = Some(sync);
        self
    }

    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: LedgerPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reads the whole grid into a snapshot without touching the store.
    pub fn parse_grid<C: GridClient>(
        &self,
        caller: CallerId,
        client: C,
    ) -> ApiResult<Snapshot> {
        require_checker(self.access, caller, "parse the grid")?;
        Ok(SnapshotParser::new(client).parse_all()?)
    }

    /// Merges a snapshot into the store after validating it.
    pub fn import_snapshot(
        &self,
        caller: CallerId,
        snapshot: &Snapshot,
    ) -> ApiResult<ReconcileStats> {
        require_checker(self.access, caller, "import snapshots")?;
        snapshot.validate()?;
        Ok(ReconcileService::new(self.conn).reconcile(snapshot)?)
    }

    /// Parses the grid and reconciles the result in one call.
    ///
    /// A failed parse persists nothing.
    pub fn sync_from_grid<C: GridClient>(
        &self,
        caller: CallerId,
        client: C,
    ) -> ApiResult<ImportReport> {
        let snapshot = self.parse_grid(caller, client)?;
        let stats = self.import_snapshot(caller, &snapshot)?;
        Ok(ImportReport { snapshot, stats })
    }

    pub fn toggle_team_task(&self, caller: CallerId, id: TeamTaskId) -> ApiResult<ToggleOutcome> {
        info!(
            "event=task_toggle module=api status=requested caller={} target=team_task:{}",
            caller, id
        );
        Ok(self.ledger().toggle_team_task(id)?)
    }

    pub fn toggle_personal_task(
        &self,
        caller: CallerId,
        id: PersonalTaskId,
    ) -> ApiResult<ToggleOutcome> {
        info!(
            "event=task_toggle module=api status=requested caller={} target=personal_task:{}",
            caller, id
        );
        Ok(self.ledger().toggle_personal_task(id)?)
    }

    /// Leaderboard honoring the display state.
    pub fn leaderboard(&self) -> ApiResult<LeaderboardView> {
        let display = self.display.snapshot();
        let visible = display.is_visible_at(self.clock.now_ms());
        let rows = if visible {
            self.ranking()?.leaderboard()?
        } else {
            Vec::new()
        };
        Ok(LeaderboardView {
            visible,
            display,
            rows,
        })
    }

    pub fn team_details(&self, number: u32) -> ApiResult<TeamDetails> {
        Ok(self.ranking()?.team_details(number)?)
    }

    /// A member and their personal tasks, including the ids toggles take.
    pub fn member_details(&self, member_id: MemberId) -> ApiResult<MemberDetails> {
        Ok(self.ranking()?.member_details(member_id)?)
    }

    pub fn member_ranking(&self, limit: Option<usize>) -> ApiResult<Vec<MemberStanding>> {
        Ok(self.ranking()?.member_ranking(limit)?)
    }

    /// Hides the leaderboard, optionally until `reveal_at_ms`, and stores it.
    pub fn hide_leaderboard(&self, caller: CallerId, reveal_at_ms: Option<i64>) -> ApiResult<()> {
        require_checker(self.access, caller, "hide the leaderboard")?;
        self.store_display(
            caller,
            DisplayState {
                hidden: true,
                reveal_at_ms,
            },
        )
    }

    pub fn show_leaderboard(&self, caller: CallerId) -> ApiResult<()> {
        require_checker(self.access, caller, "show the leaderboard")?;
        self.store_display(caller, DisplayState::default())
    }

    /// Loads the stored display state into this process's display.
    pub fn restore_display(&self) -> ApiResult<DisplayState> {
        let state = SqliteDisplayRepository::try_new(self.conn)?.load_display_state()?;
        self.display.restore(state);
        Ok(state)
    }

    fn store_display(&self, caller: CallerId, state: DisplayState) -> ApiResult<()> {
        SqliteDisplayRepository::try_new(self.conn)?.save_display_state(state)?;
        self.display.restore(state);
        info!(
            "event=display_change module=api status=ok caller={} hidden={} reveal_at_ms={:?}",
            caller, state.hidden, state.reveal_at_ms
        );
        Ok(())
    }

    fn ledger(&self) -> LedgerService<'a> {
        let ledger = LedgerService::new(self.conn)
            .with_policy(self.policy)
            .with_clock(self.clock);
        match self.sync {
            Some(sync) => ledger.with_reverse_sync(sync),
            None => ledger,
        }
    }

    fn ranking(
        &self,
    ) -> ApiResult<RankingService<SqliteTeamRepository<'a>, SqliteMemberRepository<'a>>> {
        Ok(RankingService::new(
            SqliteTeamRepository::try_new(self.conn)?,
            SqliteMemberRepository::try_new(self.conn)?,
            self.policy.max_personal_score,
        ))
    }
}
