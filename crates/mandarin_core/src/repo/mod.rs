//! Repository layer for the competition store.
//!
//! # Responsibility
//! - Define data access contracts per aggregate (teams, members, display).
//! - Keep SQL inside the persistence boundary.
//!
//! # Invariants
//! - Repositories only accept connections at the latest schema version.
//! - Persisted flags outside `0/1` surface as `RepoError::InvalidData`.
//! - Repositories never decide score arithmetic; they store what services
//!   computed.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod display_repo;
pub mod member_repo;
pub mod team_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity reference used by not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Team(i64),
    Member(i64),
    TeamTask(i64),
    PersonalTask(i64),
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Team(id) => write!(f, "team {id}"),
            Self::Member(id) => write!(f, "member {id}"),
            Self::TeamTask(id) => write!(f, "team task {id}"),
            Self::PersonalTask(id) => write!(f, "personal task {id}"),
        }
    }
}

/// Repository error for competition persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(EntityRef),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Insert payload for a team or personal task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewTask<'a> {
    pub task_number: u32,
    pub description: &'a str,
    pub is_completed: bool,
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn ensure_changed(changed: usize, entity: EntityRef) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound(entity));
    }
    Ok(())
}
