//! Fixed coordinate layout of the competition spreadsheet.
//!
//! # Responsibility
//! - Map a team ordinal or member slot to its label cell.
//! - Map a task number to the status cell next to its description.
//!
//! # Invariants
//! - Coordinates are zero-indexed `(column, row)`.
//! - A task's description cell is `(col, row + task)`, its status cell is
//!   `(col + 1, row + task)`.
//! - Parser and writer both resolve through this module; changing a table
//!   here changes both sides of the round trip.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Number of team tasks listed under every team label.
pub const TEAM_TASK_COUNT: u32 = 7;
/// Number of personal tasks listed under every member label.
pub const PERSONAL_TASK_COUNT: u32 = 10;
/// Highest team ordinal with a position on the team sheet.
pub const TEAM_COUNT: u32 = 10;
/// Number of member seats on one team sheet.
pub const MEMBER_SLOT_COUNT: usize = 12;
/// Title of the sheet holding team labels and team tasks.
pub const TEAM_SHEET_TITLE: &str = "команды";

/// Team label cells, indexed by `team_number - 1`.
/// Two rows of five: A1 D1 H1 L1 P1 / A9 D9 H9 L9 P9.
const TEAM_LABELS: [GridPosition; TEAM_COUNT as usize] = [
    GridPosition::new(0, 0),
    GridPosition::new(3, 0),
    GridPosition::new(7, 0),
    GridPosition::new(11, 0),
    GridPosition::new(15, 0),
    GridPosition::new(0, 8),
    GridPosition::new(3, 8),
    GridPosition::new(7, 8),
    GridPosition::new(11, 8),
    GridPosition::new(15, 8),
];

/// Member label cells on a team's own sheet, indexed by slot.
/// Three rows of four: rows 1, 12, 23 at columns A D G J.
const MEMBER_LABELS: [GridPosition; MEMBER_SLOT_COUNT] = [
    GridPosition::new(0, 0),
    GridPosition::new(3, 0),
    GridPosition::new(6, 0),
    GridPosition::new(9, 0),
    GridPosition::new(0, 11),
    GridPosition::new(3, 11),
    GridPosition::new(6, 11),
    GridPosition::new(9, 11),
    GridPosition::new(0, 22),
    GridPosition::new(3, 22),
    GridPosition::new(6, 22),
    GridPosition::new(9, 22),
];

/// Zero-indexed cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridPosition {
    pub column: u32,
    pub row: u32,
}

impl GridPosition {
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Cell holding the free-text description of `task_number`.
    pub fn task_label(self, task_number: u32) -> Self {
        Self::new(self.column, self.row + task_number)
    }

    /// Cell holding the completion status of `task_number`.
    pub fn task_status(self, task_number: u32) -> Self {
        Self::new(self.column + 1, self.row + task_number)
    }

    /// Renders the position in A1 notation (`(0, 0)` is `A1`).
    pub fn to_a1(self) -> String {
        format!("{}{}", column_letters(self.column), self.row + 1)
    }
}

impl Display for GridPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// Layout lookup failure. Always a caller contract violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    InvalidIndex { kind: &'static str, value: u32 },
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIndex { kind, value } => {
                write!(f, "{kind} `{value}` has no position in the grid layout")
            }
        }
    }
}

impl Error for LayoutError {}

/// Returns the label cell of team `team_number` (1-based).
pub fn team_label(team_number: u32) -> Result<GridPosition, LayoutError> {
    if team_number == 0 {
        return Err(LayoutError::InvalidIndex {
            kind: "team number",
            value: team_number,
        });
    }
    TEAM_LABELS
        .get((team_number - 1) as usize)
        .copied()
        .ok_or(LayoutError::InvalidIndex {
            kind: "team number",
            value: team_number,
        })
}

/// Returns the label cell of member seat `slot` (0-based).
pub fn member_label(slot: u32) -> Result<GridPosition, LayoutError> {
    MEMBER_LABELS
        .get(slot as usize)
        .copied()
        .ok_or(LayoutError::InvalidIndex {
            kind: "member slot",
            value: slot,
        })
}

/// Status cell of team task `task_number` for team `team_number`.
pub fn resolve_team_cell(team_number: u32, task_number: u32) -> Result<GridPosition, LayoutError> {
    Ok(team_label(team_number)?.task_status(task_number))
}

/// Status cell of personal task `task_number` for the member seated at `slot`.
pub fn resolve_member_cell(slot: u32, task_number: u32) -> Result<GridPosition, LayoutError> {
    Ok(member_label(slot)?.task_status(task_number))
}

/// Title of the member sheet for `team_number`.
pub fn member_sheet_title(team_number: u32) -> String {
    team_number.to_string()
}

/// Iterates `(team_number, label)` in ascending team order.
pub fn team_labels() -> impl Iterator<Item = (u32, GridPosition)> {
    TEAM_LABELS
        .iter()
        .enumerate()
        .map(|(index, position)| (index as u32 + 1, *position))
}

/// Iterates `(slot, label)` in ascending slot order.
pub fn member_labels() -> impl Iterator<Item = (u32, GridPosition)> {
    MEMBER_LABELS
        .iter()
        .enumerate()
        .map(|(index, position)| (index as u32, *position))
}

fn column_letters(column: u32) -> String {
    let mut remaining = column + 1;
    let mut letters = Vec::new();
    while remaining > 0 {
        let rem = (remaining - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::{
        member_labels, resolve_member_cell, resolve_team_cell, team_labels, GridPosition,
        LayoutError, MEMBER_SLOT_COUNT, PERSONAL_TASK_COUNT, TEAM_COUNT, TEAM_TASK_COUNT,
    };

    #[test]
    fn team_cells_resolve_for_every_ordinal_and_task() {
        for team in 1..=TEAM_COUNT {
            for task in 1..=TEAM_TASK_COUNT {
                let cell = resolve_team_cell(team, task).expect("valid team cell");
                let (_, label) = team_labels()
                    .find(|(number, _)| *number == team)
                    .expect("label present");
                assert_eq!(cell, GridPosition::new(label.column + 1, label.row + task));
            }
        }
    }

    #[test]
    fn team_cells_match_known_coordinates() {
        assert_eq!(resolve_team_cell(1, 1).unwrap(), GridPosition::new(1, 1));
        assert_eq!(resolve_team_cell(3, 7).unwrap(), GridPosition::new(8, 7));
        assert_eq!(resolve_team_cell(10, 2).unwrap(), GridPosition::new(16, 10));
    }

    #[test]
    fn team_ordinal_outside_table_is_rejected() {
        for bad in [0, 11, 99] {
            let err = resolve_team_cell(bad, 1).expect_err("ordinal must be rejected");
            assert!(matches!(err, LayoutError::InvalidIndex { value, .. } if value == bad));
        }
    }

    #[test]
    fn member_cells_cover_three_rows_of_four() {
        assert_eq!(resolve_member_cell(0, 1).unwrap(), GridPosition::new(1, 1));
        assert_eq!(resolve_member_cell(7, 10).unwrap(), GridPosition::new(10, 21));
        assert_eq!(resolve_member_cell(8, 3).unwrap(), GridPosition::new(1, 25));
        assert_eq!(member_labels().count(), MEMBER_SLOT_COUNT);

        for slot in 0..MEMBER_SLOT_COUNT as u32 {
            for task in 1..=PERSONAL_TASK_COUNT {
                resolve_member_cell(slot, task).expect("valid member cell");
            }
        }
    }

    #[test]
    fn member_slot_outside_table_is_rejected() {
        let err = resolve_member_cell(12, 1).expect_err("slot 12 must be rejected");
        assert_eq!(
            err,
            LayoutError::InvalidIndex {
                kind: "member slot",
                value: 12
            }
        );
    }

    #[test]
    fn renders_a1_notation() {
        assert_eq!(GridPosition::new(0, 0).to_a1(), "A1");
        assert_eq!(GridPosition::new(15, 8).to_a1(), "P9");
        assert_eq!(GridPosition::new(25, 0).to_a1(), "Z1");
        assert_eq!(GridPosition::new(26, 4).to_a1(), "AA5");
        assert_eq!(GridPosition::new(51, 9).to_a1(), "AZ10");
    }
}
