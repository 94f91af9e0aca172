//! Persisted competition entities.
//!
//! # Responsibility
//! - Mirror the stored row shape of teams, members and tasks.
//! - Provide display helpers shared by read models.
//!
//! # Invariants
//! - `Team::score` counts team-task rewards only.
//! - `Member::reached_max_at` is set only while `score` is at the maximum.

use serde::{Deserialize, Serialize};

/// Row id of a team.
pub type TeamId = i64;
/// Row id of a member.
pub type MemberId = i64;
/// Row id of a team task.
pub type TeamTaskId = i64;
/// Row id of a personal task.
pub type PersonalTaskId = i64;

/// Competing team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    /// Ordinal 1..=10, unique across teams.
    pub number: u32,
    pub name: Option<String>,
    /// Team-only score: sum of completed team-task rewards.
    pub score: i64,
}

impl Team {
    /// Stored name, or a generated `Team N` label when blank.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_team_name(self.number),
        }
    }
}

/// Generated label for a team without a name.
pub fn default_team_name(number: u32) -> String {
    format!("Team {number}")
}

/// Team participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub team_id: TeamId,
    pub first_name: String,
    pub last_name: String,
    /// Personal score: sum of completed personal tasks.
    pub score: i64,
    /// Seat on the team's sheet (0..=11).
    pub sheet_index: u32,
    /// Epoch milliseconds when `score` first reached the maximum.
    pub reached_max_at: Option<i64>,
}

impl Member {
    /// `Last First`, the order used on the sheets.
    pub fn full_name(&self) -> String {
        if self.first_name.is_empty() {
            return self.last_name.clone();
        }
        format!("{} {}", self.last_name, self.first_name)
    }
}

/// One of the seven tasks owned by a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamTask {
    pub id: TeamTaskId,
    pub team_id: TeamId,
    pub task_number: u32,
    pub description: String,
    pub is_completed: bool,
}

/// One of the ten tasks owned by a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalTask {
    pub id: PersonalTaskId,
    pub member_id: MemberId,
    pub task_number: u32,
    pub description: String,
    pub is_completed: bool,
}

#[cfg(test)]
mod tests {
    use super::{Member, Team};

    #[test]
    fn display_name_falls_back_for_blank_names() {
        let mut team = Team {
            id: 1,
            number: 4,
            name: None,
            score: 0,
        };
        assert_eq!(team.display_name(), "Team 4");
        team.name = Some("  ".to_string());
        assert_eq!(team.display_name(), "Team 4");
        team.name = Some("Tangerines".to_string());
        assert_eq!(team.display_name(), "Tangerines");
    }

    #[test]
    fn full_name_puts_last_name_first() {
        let member = Member {
            id: 1,
            team_id: 1,
            first_name: "Anna".to_string(),
            last_name: "Ivanova".to_string(),
            score: 0,
            sheet_index: 0,
            reached_max_at: None,
        };
        assert_eq!(member.full_name(), "Ivanova Anna");
    }
}
