//! Team leaderboard and member ranking.
//!
//! # Responsibility
//! - Compute team totals (`team.score + Σ member.score`) and ranks.
//! - Rank members with the maximum-score tie-breaks.
//! - Assemble per-team and per-member detail views.
//!
//! # Invariants
//! - Read-only over the store.
//! - Ranks are 1-based positions after a stable sort, so equal keys keep
//!   input order (teams by ascending number, members by id).

use crate::model::entities::{Member, MemberId, PersonalTask, Team, TeamId, TeamTask};
use crate::repo::member_repo::MemberRepository;
use crate::repo::team_repo::TeamRepository;
use crate::repo::RepoError;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RankingResult<T> = Result<T, RankingError>;

#[derive(Debug)]
pub enum RankingError {
    Repo(RepoError),
    TeamNotFound(u32),
    MemberNotFound(MemberId),
}

impl Display for RankingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::TeamNotFound(number) => write!(f, "team number {number} not found"),
            Self::MemberNotFound(id) => write!(f, "member {id} not found"),
        }
    }
}

impl Error for RankingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::TeamNotFound(_) | Self::MemberNotFound(_) => None,
        }
    }
}

impl From<RepoError> for RankingError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamStanding {
    pub rank: usize,
    pub team_id: TeamId,
    pub number: u32,
    pub name: String,
    pub team_score: i64,
    pub members_score: i64,
    pub total: i64,
    pub member_count: usize,
}

/// One member ranking row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberStanding {
    pub rank: usize,
    pub member_id: MemberId,
    pub full_name: String,
    pub team_id: TeamId,
    pub team_number: u32,
    pub score: i64,
    pub team_total: i64,
    pub reached_max_at: Option<i64>,
}

/// A team with its tasks and members ordered by score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamDetails {
    pub standing: TeamStanding,
    pub tasks: Vec<TeamTask>,
    pub members: Vec<Member>,
}

/// A member with its team and personal tasks in task-number order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberDetails {
    pub member: Member,
    pub team_number: u32,
    pub team_name: String,
    pub tasks: Vec<PersonalTask>,
}

/// Ranks teams by total score, highest first.
///
/// `teams` should arrive ordered by ascending number; that order decides ties.
pub fn rank_teams(teams: &[Team], members: &[Member]) -> Vec<TeamStanding> {
    let mut sums: HashMap<TeamId, (i64, usize)> = HashMap::new();
    for member in members {
        let entry = sums.entry(member.team_id).or_default();
        entry.0 += member.score;
        entry.1 += 1;
    }

    let mut standings = teams
        .iter()
        .map(|team| {
            let (members_score, member_count) = sums.get(&team.id).copied().unwrap_or_default();
            TeamStanding {
                rank: 0,
                team_id: team.id,
                number: team.number,
                name: team.display_name(),
                team_score: team.score,
                members_score,
                total: team.score + members_score,
                member_count,
            }
        })
        .collect::<Vec<_>>();

    standings.sort_by_key(|standing| Reverse(standing.total));
    for (index, standing) in standings.iter_mut().enumerate() {
        standing.rank = index + 1;
    }
    standings
}

/// Sort key for one member: ascending order puts the best member first.
///
/// Members at `max_score` are further ordered by team total (higher first)
/// and then by reached-maximum time (earlier first, unset last). Below the
/// maximum only the score matters.
pub fn member_sort_key(
    score: i64,
    team_total: i64,
    reached_max_at: Option<i64>,
    max_score: i64,
) -> (i64, i64, i64) {
    if score == max_score {
        (-score, -team_total, reached_max_at.unwrap_or(i64::MAX))
    } else {
        (-score, 0, 0)
    }
}

/// Ranks members, keeping at most `limit` rows when given.
///
/// Members whose team is absent from `standings` count a team total of 0.
pub fn rank_members(
    members: &[Member],
    standings: &[TeamStanding],
    max_score: i64,
    limit: Option<usize>,
) -> Vec<MemberStanding> {
    let teams: HashMap<TeamId, (u32, i64)> = standings
        .iter()
        .map(|standing| (standing.team_id, (standing.number, standing.total)))
        .collect();

    let mut ranked = members
        .iter()
        .map(|member| {
            let (team_number, team_total) =
                teams.get(&member.team_id).copied().unwrap_or((0, 0));
            MemberStanding {
                rank: 0,
                member_id: member.id,
                full_name: member.full_name(),
                team_id: member.team_id,
                team_number,
                score: member.score,
                team_total,
                reached_max_at: member.reached_max_at,
            }
        })
        .collect::<Vec<_>>();

    ranked.sort_by_key(|row| {
        member_sort_key(row.score, row.team_total, row.reached_max_at, max_score)
    });
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    for (index, row) in ranked.iter_mut().enumerate() {
        row.rank = index + 1;
    }
    ranked
}

/// Read-only ranking queries over repositories.
pub struct RankingService<T: TeamRepository, M: MemberRepository> {
    teams: T,
    members: M,
    max_score: i64,
}

impl<T: TeamRepository, M: MemberRepository> RankingService<T, M> {
    pub fn new(teams: T, members: M, max_score: i64) -> Self {
        Self {
            teams,
            members,
            max_score,
        }
    }

    /// Full team leaderboard.
    pub fn leaderboard(&self) -> RankingResult<Vec<TeamStanding>> {
        let teams = self.teams.list_teams()?;
        let members = self.members.list_all_members()?;
        Ok(rank_teams(&teams, &members))
    }

    /// Top members across all teams.
    pub fn member_ranking(&self, limit: Option<usize>) -> RankingResult<Vec<MemberStanding>> {
        let teams = self.teams.list_teams()?;
        let members = self.members.list_all_members()?;
        let standings = rank_teams(&teams, &members);
        Ok(rank_members(&members, &standings, self.max_score, limit))
    }

    /// One team's standing, tasks and members (highest personal score first).
    pub fn team_details(&self, number: u32) -> RankingResult<TeamDetails> {
        let team = self
            .teams
            .find_team_by_number(number)?
            .ok_or(RankingError::TeamNotFound(number))?;
        let standing = self
            .leaderboard()?
            .into_iter()
            .find(|standing| standing.team_id == team.id)
            .ok_or(RankingError::TeamNotFound(number))?;

        let tasks = self.teams.list_team_tasks(team.id)?;
        let mut members = self.members.list_members(team.id)?;
        members.sort_by_key(|member| Reverse(member.score));

        Ok(TeamDetails {
            standing,
            tasks,
            members,
        })
    }

    /// One member with the personal tasks a toggle can address.
    pub fn member_details(&self, member_id: MemberId) -> RankingResult<MemberDetails> {
        let member = self
            .members
            .get_member(member_id)?
            .ok_or(RankingError::MemberNotFound(member_id))?;
        let team = self
            .teams
            .get_team(member.team_id)?
            .ok_or(RankingError::MemberNotFound(member_id))?;
        let tasks = self.members.list_personal_tasks(member.id)?;

        Ok(MemberDetails {
            member,
            team_number: team.number,
            team_name: team.display_name(),
            tasks,
        })
    }
}
